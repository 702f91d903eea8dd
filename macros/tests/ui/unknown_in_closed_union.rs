use anthropic_types::union;

#[union(closed)]
pub enum Mark {
    #[variant(tag = "dot")]
    Dot(String),
    #[variant(unknown)]
    Unknown(serde_json::Value),
}

fn main() {}
