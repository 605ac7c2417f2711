use serde::{Deserialize, Serialize};

/// Taste personality derived from a ranked collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    /// Fewer than five ranked titles
    GettingStarted,
    Critic,
    Enthusiast,
    BingeWatcher,
    HorrorHound,
    ComedyConnoisseur,
    DramaDevotee,
    BlockbusterFan,
    Nostalgist,
    Trendsetter,
    Cinephile,
    Eclectic,
}

impl Archetype {
    /// Display name
    pub fn title(&self) -> &'static str {
        match self {
            Archetype::GettingStarted => "Getting Started",
            Archetype::Critic => "The Critic",
            Archetype::Enthusiast => "The Enthusiast",
            Archetype::BingeWatcher => "The Binge-Watcher",
            Archetype::HorrorHound => "The Horror Hound",
            Archetype::ComedyConnoisseur => "The Comedy Connoisseur",
            Archetype::DramaDevotee => "The Drama Devotee",
            Archetype::BlockbusterFan => "The Blockbuster Fan",
            Archetype::Nostalgist => "The Nostalgist",
            Archetype::Trendsetter => "The Trendsetter",
            Archetype::Cinephile => "The Cinephile",
            Archetype::Eclectic => "The Eclectic",
        }
    }

    /// One-line description
    pub fn tagline(&self) -> &'static str {
        match self {
            Archetype::GettingStarted => "Rank a few more titles to reveal your taste.",
            Archetype::Critic => "Hard to impress, and proud of it.",
            Archetype::Enthusiast => "You find something to love in almost everything.",
            Archetype::BingeWatcher => "One more episode is never just one.",
            Archetype::HorrorHound => "The scarier, the better.",
            Archetype::ComedyConnoisseur => "You watch to laugh.",
            Archetype::DramaDevotee => "You want stories that hit hard.",
            Archetype::BlockbusterFan => "Big screens, big stakes, big explosions.",
            Archetype::Nostalgist => "They don't make them like they used to.",
            Archetype::Trendsetter => "Always watching what just came out.",
            Archetype::Cinephile => "Film as an art form.",
            Archetype::Eclectic => "A little bit of everything.",
        }
    }
}

/// One entry of the top-genre breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreShare {
    pub genre: String,
    /// Rounded percentage of genre-tagged items carrying this genre
    pub percentage: u32,
}

/// Aggregate statistics that accompany the archetype
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TasteDna {
    pub top_genres: Vec<GenreShare>,
    /// Mean tier weight on a 1.0-3.0 scale
    pub average_score: f64,
    /// Rounded percentage of items in the bad tier
    pub pickiness: u32,
    pub favorite_decade: Option<String>,
    pub movie_count: usize,
    pub show_count: usize,
}

/// Result of classifying a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TasteProfile {
    pub archetype: Archetype,
    pub title: String,
    pub tagline: String,
    pub facts: Vec<String>,
    pub dna: TasteDna,
}

impl TasteProfile {
    pub fn new(archetype: Archetype, facts: Vec<String>, dna: TasteDna) -> Self {
        Self {
            archetype,
            title: archetype.title().to_string(),
            tagline: archetype.tagline().to_string(),
            facts,
            dna,
        }
    }
}
