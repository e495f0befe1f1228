use serde::Serialize;

/// Phrase the model is instructed to reply with when the text holds no list.
pub const NO_LIST_SENTINEL: &str = "No grocery list found.";

/// Classified model reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Summary {
    NoList,
    List(String),
}

impl Summary {
    pub fn classify(reply: &str) -> Self {
        if reply.contains(NO_LIST_SENTINEL) {
            Summary::NoList
        } else {
            Summary::List(reply.to_string())
        }
    }

    pub fn items(&self) -> Vec<GroceryItem> {
        match self {
            Summary::NoList => Vec::new(),
            Summary::List(text) => GroceryItem::parse_lines(text),
        }
    }
}

/// One `- item, kg, count` line of a generated list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroceryItem {
    pub name: String,
    pub kg: Option<f64>,
    pub count: Option<u32>,
}

impl GroceryItem {
    /// Parse every bulleted line of a reply. Lines without a bullet are ignored,
    /// as are weights or counts that are placeholders rather than numbers.
    pub fn parse_lines(text: &str) -> Vec<Self> {
        text.lines().filter_map(Self::parse_line).collect()
    }

    fn parse_line(line: &str) -> Option<Self> {
        let rest = line.trim().strip_prefix('-')?.trim();
        let mut fields = rest.split(',').map(str::trim);

        let name = fields.next().filter(|n| !n.is_empty())?.to_string();
        let kg = fields.next().and_then(parse_weight);
        let count = fields.next().and_then(parse_count);

        Some(Self { name, kg, count })
    }
}

fn parse_weight(field: &str) -> Option<f64> {
    let lowered = field.to_ascii_lowercase();
    let number = lowered
        .trim_end_matches("kgs")
        .trim_end_matches("kg")
        .trim();
    number.parse::<f64>().ok().filter(|kg| *kg >= 0.0)
}

fn parse_count(field: &str) -> Option<u32> {
    let lowered = field.to_ascii_lowercase();
    let number = lowered
        .trim_start_matches('x')
        .trim_end_matches("pcs")
        .trim();
    number.parse::<u32>().ok()
}
