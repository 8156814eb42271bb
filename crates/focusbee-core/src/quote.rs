//! Quote of the day. The same date always picks the same quote.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub quote: String,
    pub author: String,
}

impl Quote {
    pub fn new(quote: &str, author: &str) -> Self {
        Self {
            quote: quote.to_string(),
            author: author.to_string(),
        }
    }
}

impl std::fmt::Display for Quote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\"\n  - {}", self.quote, self.author)
    }
}

pub fn builtin() -> Vec<Quote> {
    vec![
        Quote::new("The secret of getting ahead is getting started.", "Mark Twain"),
        Quote::new("It always seems impossible until it's done.", "Nelson Mandela"),
        Quote::new("Focus on being productive instead of busy.", "Tim Ferriss"),
        Quote::new("You don't have to see the whole staircase, just take the first step.", "Martin Luther King Jr."),
        Quote::new("Concentrate all your thoughts upon the work at hand.", "Alexander Graham Bell"),
        Quote::new("Action is the foundational key to all success.", "Pablo Picasso"),
        Quote::new("Small deeds done are better than great deeds planned.", "Peter Marshall"),
    ]
}

/// `h = h * 31 + c` over the `YYYY-MM-DD` string in wrapping 32-bit math.
fn date_hash(date: NaiveDate) -> i32 {
    date.format("%Y-%m-%d")
        .to_string()
        .chars()
        .fold(0i32, |h, c| {
            // Every char of the formatted date is ASCII.
            let code = i32::try_from(u32::from(c)).unwrap_or(0);
            h.wrapping_shl(5).wrapping_sub(h).wrapping_add(code)
        })
}

pub fn daily(quotes: &[Quote], date: NaiveDate) -> Quote {
    if quotes.is_empty() {
        return Quote::new("Every day is a new beginning.", "Unknown");
    }
    let index = usize::try_from(date_hash(date).unsigned_abs()).unwrap_or(0) % quotes.len();
    quotes[index].clone()
}
