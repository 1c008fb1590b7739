use std::collections::BTreeMap;
use std::fmt::Display;
use tracing::warn;

use crate::source::TableData;

/// Record types of interest on the GEMS data page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordKind {
    Rga,
    TurboStatus,
    AdvStatus,
    AdvData,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::Rga,
        RecordKind::TurboStatus,
        RecordKind::AdvStatus,
        RecordKind::AdvData,
    ];

    pub fn type_char(&self) -> char {
        match self {
            RecordKind::Rga => 'R',
            RecordKind::TurboStatus => '!',
            RecordKind::AdvStatus => 'S',
            RecordKind::AdvData => 'D',
        }
    }

    pub fn from_type_char(type_char: char) -> Option<Self> {
        RecordKind::ALL
            .into_iter()
            .find(|kind| kind.type_char() == type_char)
    }
}

impl Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RecordKind::Rga => "RGA",
            RecordKind::TurboStatus => "turbo pump status",
            RecordKind::AdvStatus => "ADV status",
            RecordKind::AdvData => "ADV data",
        };
        write!(f, "{}", name)
    }
}

/// Payloads grouped by their type character.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SortedRecords {
    by_type: BTreeMap<char, Vec<String>>,
}

impl SortedRecords {
    pub fn get(&self, kind: RecordKind) -> &[String] {
        self.get_by_char(kind.type_char())
    }

    pub fn get_by_char(&self, type_char: char) -> &[String] {
        self.by_type
            .get(&type_char)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, &[String])> {
        self.by_type.iter().map(|(c, v)| (*c, v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }

    fn push(&mut self, type_char: char, payload: String) {
        self.by_type.entry(type_char).or_default().push(payload);
    }
}

/// Groups table rows by record type.
///
/// Only the first cell of a row is read. It has the shape `[num]T:payload`,
/// turbo pump lines use `!` instead of `:` to separate the payload.
pub fn sort_by_type(table_data: &TableData) -> SortedRecords {
    let mut sorted = SortedRecords::default();
    for row in table_data {
        let Some(text) = row.first() else { continue };
        if text.chars().count() < 2 {
            continue;
        }
        match split_row(text) {
            Some((type_char, payload)) => sorted.push(type_char, payload.to_string()),
            None => warn!("Row without record type: {}", text),
        }
    }
    sorted
}

fn split_row(text: &str) -> Option<(char, &str)> {
    let type_start = text.find(']').map(|i| i + 1).unwrap_or(0);
    let type_char = text[type_start..].chars().next()?;
    let payload = match text.find('!').or_else(|| text.find(':')) {
        Some(i) => &text[i + 1..],
        None => text,
    };
    Some((type_char, payload))
}

#[cfg(test)]
mod test {
    use super::*;

    fn table(rows: &[&str]) -> TableData {
        rows.iter().map(|r| vec![r.to_string()]).collect()
    }

    #[test]
    fn sort_rows_by_type_char() {
        let data = table(&[
            "[1]R:2024-03-15T07:00:01,28,51234",
            "[2]S:2024-03-15T07:00:02,1,2,3,4,5,6,7,8,9,10,11,12",
            "[3]R:2024-03-15T07:00:03,32,1234",
        ]);

        let sorted = sort_by_type(&data);

        assert_eq!(
            sorted.get(RecordKind::Rga),
            &[
                "2024-03-15T07:00:01,28,51234".to_string(),
                "2024-03-15T07:00:03,32,1234".to_string()
            ]
        );
        assert_eq!(sorted.get(RecordKind::AdvStatus).len(), 1);
        assert!(sorted.get(RecordKind::AdvData).is_empty());
    }

    #[test]
    fn turbo_payload_follows_exclamation_mark() {
        let data = table(&["[9]!2024-03-15T07:00:01,0,1000,20,24,30,31,32,1.5"]);

        let sorted = sort_by_type(&data);

        assert_eq!(
            sorted.get(RecordKind::TurboStatus),
            &["2024-03-15T07:00:01,0,1000,20,24,30,31,32,1.5".to_string()]
        );
    }

    #[test]
    fn short_and_empty_rows_are_skipped() {
        let data = vec![vec![], vec!["R".to_string()], vec!["[1]".to_string()]];

        assert!(sort_by_type(&data).is_empty());
    }

    #[test]
    fn rows_without_brackets_or_separator() {
        let data = table(&["Xabc", "[4]Qno separator"]);

        let sorted = sort_by_type(&data);

        assert_eq!(sorted.get_by_char('X'), &["Xabc".to_string()]);
        assert_eq!(sorted.get_by_char('Q'), &["[4]Qno separator".to_string()]);
        assert_eq!(
            sorted.iter().map(|(c, _)| c).collect::<Vec<_>>(),
            vec!['Q', 'X']
        );
    }

    #[test]
    fn only_first_cell_is_used() {
        let data = vec![vec!["[1]D:1,2".to_string(), "[2]R:ignored".to_string()]];

        let sorted = sort_by_type(&data);

        assert_eq!(sorted.get(RecordKind::AdvData), &["1,2".to_string()]);
        assert!(sorted.get(RecordKind::Rga).is_empty());
    }

    #[test]
    fn kind_round_trips_through_type_char() {
        for kind in RecordKind::ALL {
            assert_eq!(RecordKind::from_type_char(kind.type_char()), Some(kind));
        }
        assert_eq!(RecordKind::from_type_char('Z'), None);
    }
}
