use std::collections::{HashMap, HashSet};

use chrono::{Datelike, Utc};

use crate::{
    models::{Archetype, GenreShare, MediaType, RankedItem, TasteDna, TasteProfile, Tier},
    services::scoring::round_to_tenth,
};

/// Collections smaller than this get the `GettingStarted` profile
pub const MIN_ITEMS_FOR_PROFILE: usize = 5;

const BLOCKBUSTER_GENRES: [&str; 3] = ["Action", "Adventure", "Science Fiction"];
const PRESTIGE_GENRES: [&str; 4] = ["Drama", "History", "War", "Documentary"];

/// Aggregates shared by every rule
#[derive(Debug, Clone)]
struct TasteStats {
    total: usize,
    movies: usize,
    shows: usize,
    good: usize,
    medium: usize,
    bad: usize,
    /// Descending by count, ties by name
    genres: Vec<(String, usize)>,
    genre_tagged: usize,
    /// Descending by count, ties favour the later decade
    decades: Vec<(i32, usize)>,
    year_tagged: usize,
    pre_2010: usize,
    recent: usize,
}

impl TasteStats {
    fn collect(items: &[RankedItem], current_year: i32) -> Self {
        let mut stats = TasteStats {
            total: items.len(),
            movies: 0,
            shows: 0,
            good: 0,
            medium: 0,
            bad: 0,
            genres: Vec::new(),
            genre_tagged: 0,
            decades: Vec::new(),
            year_tagged: 0,
            pre_2010: 0,
            recent: 0,
        };
        let mut genre_counts: HashMap<&str, usize> = HashMap::new();
        let mut decade_counts: HashMap<i32, usize> = HashMap::new();

        for item in items {
            match item.media_type {
                MediaType::Movie => stats.movies += 1,
                MediaType::Show => stats.shows += 1,
            }
            match item.tier {
                Tier::Good => stats.good += 1,
                Tier::Medium => stats.medium += 1,
                Tier::Bad => stats.bad += 1,
            }

            if !item.genre_names.is_empty() {
                stats.genre_tagged += 1;
                let distinct: HashSet<&str> =
                    item.genre_names.iter().map(String::as_str).collect();
                for genre in distinct {
                    *genre_counts.entry(genre).or_default() += 1;
                }
            }

            if let Some(year) = item.release_year() {
                stats.year_tagged += 1;
                *decade_counts.entry(year / 10 * 10).or_default() += 1;
                if year < 2010 {
                    stats.pre_2010 += 1;
                }
                if year >= current_year - 2 {
                    stats.recent += 1;
                }
            }
        }

        stats.genres = genre_counts
            .into_iter()
            .map(|(genre, count)| (genre.to_string(), count))
            .collect();
        stats
            .genres
            .sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        stats.decades = decade_counts.into_iter().collect();
        stats.decades.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));

        stats
    }

    fn share(part: usize, whole: usize) -> f64 {
        if whole == 0 {
            0.0
        } else {
            part as f64 / whole as f64
        }
    }

    fn percent(part: usize, whole: usize) -> u32 {
        (Self::share(part, whole) * 100.0).round() as u32
    }

    fn good_share(&self) -> f64 {
        Self::share(self.good, self.total)
    }

    fn lukewarm_share(&self) -> f64 {
        Self::share(self.medium + self.bad, self.total)
    }

    fn show_share(&self) -> f64 {
        Self::share(self.shows, self.total)
    }

    fn movie_share(&self) -> f64 {
        Self::share(self.movies, self.total)
    }

    fn dominant_genre(&self) -> Option<(&str, usize)> {
        self.genres.first().map(|(genre, count)| (genre.as_str(), *count))
    }

    fn dominant_genre_share(&self) -> f64 {
        self.dominant_genre()
            .map(|(_, count)| Self::share(count, self.genre_tagged))
            .unwrap_or(0.0)
    }

    /// Summed counts for a genre set, matched case-insensitively
    fn genre_group_count(&self, group: &[&str]) -> usize {
        self.genres
            .iter()
            .filter(|(genre, _)| group.iter().any(|g| g.eq_ignore_ascii_case(genre)))
            .map(|(_, count)| count)
            .sum()
    }

    fn genre_group_share(&self, group: &[&str]) -> f64 {
        Self::share(self.genre_group_count(group), self.genre_tagged)
    }

    fn favorite_decade(&self) -> Option<String> {
        self.decades.first().map(|(decade, _)| format!("{}s", decade))
    }

    fn pre_2010_share(&self) -> f64 {
        Self::share(self.pre_2010, self.year_tagged)
    }

    fn recent_share(&self) -> f64 {
        Self::share(self.recent, self.year_tagged)
    }

    fn dna(&self) -> TasteDna {
        let weighted = self.good as f64 * Tier::Good.weight()
            + self.medium as f64 * Tier::Medium.weight()
            + self.bad as f64 * Tier::Bad.weight();
        let average_score = if self.total == 0 {
            0.0
        } else {
            round_to_tenth(weighted / self.total as f64)
        };

        TasteDna {
            top_genres: self
                .genres
                .iter()
                .take(3)
                .map(|(genre, count)| GenreShare {
                    genre: genre.clone(),
                    percentage: Self::percent(*count, self.genre_tagged),
                })
                .collect(),
            average_score,
            pickiness: Self::percent(self.bad, self.total),
            favorite_decade: self.favorite_decade(),
            movie_count: self.movies,
            show_count: self.shows,
        }
    }
}

/// Archetype the dominant genre maps to, if it has one
fn genre_archetype(genre: &str) -> Option<Archetype> {
    let lower = genre.to_lowercase();
    match lower.as_str() {
        "horror" => Some(Archetype::HorrorHound),
        "comedy" => Some(Archetype::ComedyConnoisseur),
        "drama" => Some(Archetype::DramaDevotee),
        "action" | "adventure" | "science fiction" => Some(Archetype::BlockbusterFan),
        _ => None,
    }
}

/// One link of the priority chain
struct TasteRule {
    /// Returns the archetype when the rule matches
    matches: fn(&TasteStats) -> Option<Archetype>,
    facts: fn(&TasteStats) -> Vec<String>,
}

/// Evaluated top to bottom; the first match wins. Several predicates can hold
/// at once, so the order is part of the behavior.
const RULES: &[TasteRule] = &[
    TasteRule {
        matches: |s| {
            (s.good_share() < 0.25 && s.lukewarm_share() > 0.60).then_some(Archetype::Critic)
        },
        facts: |s| {
            vec![
                format!("Only {}% of your titles made the good tier", TasteStats::percent(s.good, s.total)),
                format!("{}% landed in medium or bad", TasteStats::percent(s.medium + s.bad, s.total)),
            ]
        },
    },
    TasteRule {
        matches: |s| (s.good_share() > 0.70).then_some(Archetype::Enthusiast),
        facts: |s| {
            vec![
                format!("{}% of your titles are in the good tier", TasteStats::percent(s.good, s.total)),
                format!("{} of {} titles earned a good rating", s.good, s.total),
            ]
        },
    },
    TasteRule {
        matches: |s| (s.show_share() > 0.65).then_some(Archetype::BingeWatcher),
        facts: |s| {
            vec![
                format!("{}% of your rankings are shows", TasteStats::percent(s.shows, s.total)),
                format!("{} shows versus {} movies", s.shows, s.movies),
            ]
        },
    },
    TasteRule {
        matches: |s| {
            if s.dominant_genre_share() <= 0.40 {
                return None;
            }
            s.dominant_genre().and_then(|(genre, _)| genre_archetype(genre))
        },
        facts: |s| {
            let mut facts = Vec::new();
            if let Some((genre, count)) = s.dominant_genre() {
                facts.push(format!(
                    "{} shows up in {}% of your genre-tagged titles",
                    genre,
                    TasteStats::percent(count, s.genre_tagged)
                ));
                facts.push(format!("{} of your titles are {}", count, genre));
            }
            if let Some((runner_up, _)) = s.genres.get(1) {
                facts.push(format!("{} comes in a distant second", runner_up));
            }
            facts
        },
    },
    TasteRule {
        matches: |s| {
            (s.genre_group_share(&BLOCKBUSTER_GENRES) > 0.45).then_some(Archetype::BlockbusterFan)
        },
        facts: |s| {
            vec![
                format!(
                    "Action, adventure and sci-fi make up {}% of your genre tags",
                    TasteStats::percent(s.genre_group_count(&BLOCKBUSTER_GENRES), s.genre_tagged)
                ),
                format!("{} titles with genre data", s.genre_tagged),
            ]
        },
    },
    TasteRule {
        matches: |s| (s.pre_2010_share() > 0.60).then_some(Archetype::Nostalgist),
        facts: |s| {
            let mut facts = vec![format!(
                "{}% of your titles were released before 2010",
                TasteStats::percent(s.pre_2010, s.year_tagged)
            )];
            if let Some(decade) = s.favorite_decade() {
                facts.push(format!("Your favorite decade is the {}", decade));
            }
            facts.push(format!("{} of {} dated titles are pre-2010", s.pre_2010, s.year_tagged));
            facts
        },
    },
    TasteRule {
        matches: |s| (s.recent_share() > 0.50).then_some(Archetype::Trendsetter),
        facts: |s| {
            vec![
                format!(
                    "{}% of your titles came out in the last two years",
                    TasteStats::percent(s.recent, s.year_tagged)
                ),
                format!("{} recent releases ranked", s.recent),
            ]
        },
    },
    TasteRule {
        matches: |s| {
            (s.movie_share() > 0.70 && s.genre_group_share(&PRESTIGE_GENRES) > 0.30)
                .then_some(Archetype::Cinephile)
        },
        facts: |s| {
            vec![
                format!("{}% of your rankings are movies", TasteStats::percent(s.movies, s.total)),
                format!(
                    "Drama, history, war and documentary account for {}% of your genre tags",
                    TasteStats::percent(s.genre_group_count(&PRESTIGE_GENRES), s.genre_tagged)
                ),
            ]
        },
    },
    TasteRule {
        matches: |_| Some(Archetype::Eclectic),
        facts: |s| {
            let mut facts = vec![format!("{} different genres across your rankings", s.genres.len())];
            if let Some(decade) = s.favorite_decade() {
                facts.push(format!("The {} edge out other decades", decade));
            }
            facts.push(format!("{} movies and {} shows", s.movies, s.shows));
            facts
        },
    },
];

/// Classifies a collection into a taste archetype.
///
/// Pure and total: any input, including an empty one, yields a profile.
/// `current_year` anchors the "recent releases" statistic.
pub fn classify(items: &[RankedItem], current_year: i32) -> TasteProfile {
    let stats = TasteStats::collect(items, current_year);
    let dna = stats.dna();

    if stats.total < MIN_ITEMS_FOR_PROFILE {
        let remaining = MIN_ITEMS_FOR_PROFILE - stats.total;
        let noun = if remaining == 1 { "title" } else { "titles" };
        let facts = vec![format!(
            "Rank {} more {} to unlock your taste profile",
            remaining, noun
        )];
        return TasteProfile::new(Archetype::GettingStarted, facts, dna);
    }

    for rule in RULES {
        if let Some(archetype) = (rule.matches)(&stats) {
            let mut facts = (rule.facts)(&stats);
            facts.truncate(3);
            tracing::debug!(archetype = ?archetype, items = stats.total, "Taste classified");
            return TasteProfile::new(archetype, facts, dna);
        }
    }

    // The final rule always matches
    TasteProfile::new(Archetype::Eclectic, Vec::new(), dna)
}

/// `classify` anchored at the current UTC year
pub fn classify_now(items: &[RankedItem]) -> TasteProfile {
    classify(items, Utc::now().year())
}
