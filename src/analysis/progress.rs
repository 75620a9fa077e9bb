use crate::record::VerseRecord;
use std::collections::{BTreeMap, HashMap};

pub const OVERALL: &str = "Overall";

/// Share of a book's characters that have been typed at least once.
#[derive(Debug, Clone, PartialEq)]
pub struct BookProgress {
    pub book: String,
    pub total_characters: i64,
    pub typed_characters: i64,
}

impl BookProgress {
    pub fn percent_typed(&self) -> f64 {
        if self.total_characters == 0 {
            0.0
        } else {
            100.0 * self.typed_characters as f64 / self.total_characters as f64
        }
    }
}

/// One row per book in canonical book order, followed by an overall row.
pub fn progress_by_book(catalog: &[VerseRecord]) -> Vec<BookProgress> {
    let mut books: BTreeMap<i64, BookProgress> = BTreeMap::new();
    for verse in catalog {
        let entry = books.entry(verse.book_num).or_insert_with(|| BookProgress {
            book: verse.book.clone(),
            total_characters: 0,
            typed_characters: 0,
        });
        entry.total_characters += verse.characters;
        if verse.tests >= 1 {
            entry.typed_characters += verse.characters;
        }
    }
    let mut rows: Vec<BookProgress> = books.into_values().collect();
    let overall = BookProgress {
        book: OVERALL.to_string(),
        total_characters: rows.iter().map(|b| b.total_characters).sum(),
        typed_characters: rows.iter().map(|b| b.typed_characters).sum(),
    };
    rows.push(overall);
    rows
}

/// One verse placed on a roughly square grid for the typed-verses chart.
#[derive(Debug, Clone, PartialEq)]
pub struct VerseCell {
    pub verse_id: i64,
    pub column: i64,
    pub row: usize,
    pub typed: bool,
}

/// Columns are `verse_id` modulo the rounded square root of the catalog
/// size; each verse stacks on top of the earlier verses in its column.
pub fn verse_grid(catalog: &[VerseRecord]) -> Vec<VerseCell> {
    let columns = ((catalog.len() as f64).sqrt().round() as i64).max(1);
    let mut heights: HashMap<i64, usize> = HashMap::new();
    catalog
        .iter()
        .map(|verse| {
            let column = verse.verse_id.rem_euclid(columns);
            let height = heights.entry(column).or_default();
            let row = *height;
            *height += 1;
            VerseCell {
                verse_id: verse.verse_id,
                column,
                row,
                typed: verse.tests >= 1,
            }
        })
        .collect()
}
