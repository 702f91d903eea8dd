use anthropic_types::union;

#[union(closed)]
pub enum Mark {
    #[variant(tag = "dot")]
    Dot(String),
    Dash(String),
}

fn main() {}
