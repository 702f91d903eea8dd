use anthropic_types::record;

#[record]
pub struct Note {
    #[field(nullable)]
    pub body: String,
}

fn main() {}
