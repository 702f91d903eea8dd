use anthropic_types::union;

#[union(closed)]
pub enum Mark {
    #[variant(tag = "dot")]
    Dot(String),
    #[variant(tag = "dot")]
    Point(String),
}

fn main() {}
