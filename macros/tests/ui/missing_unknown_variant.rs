use anthropic_types::union;

#[union(open)]
pub enum Mark {
    #[variant(tag = "dot")]
    Dot(String),
}

fn main() {}
