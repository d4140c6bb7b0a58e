use crate::api::FeedItem;
use crate::util::sort_timestamp;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Display order for the feed. Sorting is always derived; the canonical
/// item list keeps server order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Relevance,
    Date,
    Amount,
}

impl SortMode {
    /// Sidebar order.
    pub const ALL: [SortMode; 3] = [SortMode::Relevance, SortMode::Date, SortMode::Amount];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::Date => "date",
            Self::Amount => "amount",
        }
    }

    /// Button label in the sidebar.
    pub fn label(self) -> &'static str {
        match self {
            Self::Relevance => "AI MATCH",
            Self::Date => "NEWEST",
            Self::Amount => "VALUE $",
        }
    }

    /// Descending comparator for this mode. Equal keys compare `Equal`, so a
    /// stable sort keeps server order among ties.
    pub fn compare(self, a: &FeedItem, b: &FeedItem) -> Ordering {
        match self {
            Self::Relevance => b.score().total_cmp(&a.score()),
            Self::Amount => b.amount().total_cmp(&a.amount()),
            Self::Date => sort_timestamp(&b.posted_date).cmp(&sort_timestamp(&a.posted_date)),
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort mode '{0}' (expected relevance, date or amount)")]
pub struct UnknownSortMode(pub String);

impl FromStr for SortMode {
    type Err = UnknownSortMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relevance" => Ok(Self::Relevance),
            "date" => Ok(Self::Date),
            "amount" => Ok(Self::Amount),
            other => Err(UnknownSortMode(other.to_string())),
        }
    }
}

/// Borrowed view of `items` in display order.
pub fn sorted_view(items: &[FeedItem], mode: SortMode) -> Vec<&FeedItem> {
    let mut view: Vec<&FeedItem> = items.iter().collect();
    view.sort_by(|a, b| mode.compare(a, b));
    view
}
