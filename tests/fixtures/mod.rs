//! Sample trigger payloads and queue deliveries.

use grocery_assistant::models::message::Delivery;

pub const BUCKET: &str = "b";

/// Storage notification as delivered by S3, with a form-encoded key.
pub fn storage_event(keys: &[&str]) -> serde_json::Value {
    let records: Vec<_> = keys
        .iter()
        .map(|key| {
            serde_json::json!({
                "eventVersion": "2.1",
                "eventSource": "aws:s3",
                "awsRegion": "us-east-1",
                "eventTime": "2024-11-02T10:15:00.000Z",
                "eventName": "ObjectCreated:Put",
                "userIdentity": { "principalId": "AWS:EXAMPLE" },
                "requestParameters": { "sourceIPAddress": "127.0.0.1" },
                "responseElements": {
                    "x-amz-request-id": "C3D13FE58DE4C810",
                    "x-amz-id-2": "FMyUVURIY8/IgAtTv8xRjskZQpcIZ9KG4V5Wp6S7S/JRWeUWerMUE5JgHvANOjpD"
                },
                "s3": {
                    "s3SchemaVersion": "1.0",
                    "configurationId": "grocery-upload",
                    "bucket": {
                        "name": BUCKET,
                        "ownerIdentity": { "principalId": "EXAMPLE" },
                        "arn": "arn:aws:s3:::b"
                    },
                    "object": {
                        "key": key,
                        "size": 1024,
                        "eTag": "d41d8cd98f00b204e9800998ecf8427e",
                        "sequencer": "0055AED6DCD90281E5"
                    }
                }
            })
        })
        .collect();
    serde_json::json!({ "Records": records })
}

pub fn delivery(id: &str, body: &str) -> Delivery {
    Delivery {
        message_id: id.to_string(),
        body: Some(body.to_string()),
        receipt_handle: Some(format!("receipt-{id}")),
    }
}

pub fn message_body(text: &str, key: &str) -> String {
    serde_json::json!({ "text": text, "bucket": BUCKET, "key": key }).to_string()
}
