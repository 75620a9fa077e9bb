use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// First column of every test-results file; a file whose first cell
/// holds this text carries its own header row.
pub const HEADER_SENTINEL: &str = "Test_Number";

/// Column order of headerless test-result files.
pub const TEST_RESULT_COLUMNS: [&str; 21] = [
    "Test_Number",
    "Within_Session_Test_Number",
    "Unix_Test_Start_Time",
    "Local_Test_Start_Time",
    "Unix_Test_End_Time",
    "Local_Test_End_Time",
    "Verse_ID",
    "Verse_Code",
    "Verse",
    "Characters",
    "WPM",
    "Test_Seconds",
    "Error_Rate",
    "Error_and_Backspace_Rate",
    "Marathon_Mode",
    "Player",
    "Mode",
    "Tag_1",
    "Tag_2",
    "Tag_3",
    "Notes",
];

/// Newer game builds add a session counter after the test number.
pub const TEST_RESULT_COLUMNS_WITH_SESSION: [&str; 22] = [
    "Test_Number",
    "Session_Number",
    "Within_Session_Test_Number",
    "Unix_Test_Start_Time",
    "Local_Test_Start_Time",
    "Unix_Test_End_Time",
    "Local_Test_End_Time",
    "Verse_ID",
    "Verse_Code",
    "Verse",
    "Characters",
    "WPM",
    "Test_Seconds",
    "Error_Rate",
    "Error_and_Backspace_Rate",
    "Marathon_Mode",
    "Player",
    "Mode",
    "Tag_1",
    "Tag_2",
    "Tag_3",
    "Notes",
];

/// Pick the positional column list matching a headerless row width.
pub fn columns_for_width(width: usize) -> Option<&'static [&'static str]> {
    match width {
        21 => Some(&TEST_RESULT_COLUMNS),
        22 => Some(&TEST_RESULT_COLUMNS_WITH_SESSION),
        _ => None,
    }
}

/// One completed typing test as logged by the game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    #[serde(rename = "Test_Number")]
    pub test_number: i64,
    #[serde(rename = "Session_Number", default)]
    pub session_number: Option<i64>,
    #[serde(rename = "Within_Session_Test_Number", default)]
    pub within_session_test_number: Option<i64>,
    #[serde(rename = "Unix_Test_Start_Time")]
    pub unix_start: f64,
    #[serde(rename = "Local_Test_Start_Time")]
    pub local_start: String,
    #[serde(rename = "Unix_Test_End_Time")]
    pub unix_end: f64,
    #[serde(rename = "Local_Test_End_Time")]
    pub local_end: String,
    #[serde(rename = "Verse_ID")]
    pub verse_id: i64,
    #[serde(rename = "Verse_Code", default)]
    pub verse_code: String,
    #[serde(rename = "Verse", default)]
    pub verse: String,
    #[serde(rename = "Characters")]
    pub characters: i64,
    #[serde(rename = "WPM")]
    pub wpm: f64,
    #[serde(rename = "Test_Seconds")]
    pub test_seconds: f64,
    #[serde(rename = "Error_Rate")]
    pub error_rate: f64,
    #[serde(rename = "Error_and_Backspace_Rate")]
    pub error_and_backspace_rate: f64,
    #[serde(rename = "Marathon_Mode", default)]
    pub marathon_mode: Option<i64>,
    #[serde(rename = "Player")]
    pub player: String,
    #[serde(rename = "Mode", default)]
    pub mode: String,
    #[serde(rename = "Tag_1", default)]
    pub tag_1: Option<i64>,
    #[serde(rename = "Tag_2", default)]
    pub tag_2: Option<i64>,
    #[serde(rename = "Tag_3", default)]
    pub tag_3: Option<i64>,
    #[serde(rename = "Notes", default)]
    pub notes: String,
}

impl TestRecord {
    pub fn local_start_time(&self) -> Option<NaiveDateTime> {
        parse_local_timestamp(&self.local_start)
    }

    pub fn local_end_time(&self) -> Option<NaiveDateTime> {
        parse_local_timestamp(&self.local_end)
    }

    /// Tag meanings in multiplayer files.
    pub fn round(&self) -> Option<i64> {
        self.tag_1
    }

    pub fn test_within_round(&self) -> Option<i64> {
        self.tag_2
    }

    pub fn player_test_number(&self) -> Option<i64> {
        self.tag_3
    }
}

/// One word typed inside a test, from the word-results log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordRecord {
    #[serde(rename = "Word")]
    pub word: String,
    #[serde(rename = "WPM")]
    pub wpm: f64,
    #[serde(rename = "Error_and_Backspace_Rate")]
    pub error_and_backspace_rate: f64,
}

/// One verse from the game's verse catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerseRecord {
    #[serde(rename = "Verse_ID")]
    pub verse_id: i64,
    #[serde(rename = "Book_Num")]
    pub book_num: i64,
    #[serde(rename = "Book")]
    pub book: String,
    #[serde(rename = "Characters")]
    pub characters: i64,
    #[serde(rename = "Tests", default)]
    pub tests: i64,
}

/// Parse the wall-clock part (first 19 characters) of a local timestamp.
/// Accepts a `T` or a space between date and time; offsets and
/// fractional seconds past the 19th character are ignored.
pub fn parse_local_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let head: String = raw.trim().chars().take(19).collect();
    NaiveDateTime::parse_from_str(&head, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(&head, "%Y-%m-%d %H:%M:%S"))
        .ok()
}

/// Condensed `YYYYMMDDThhmmss` form of a local timestamp string.
pub fn condensed_timestamp(raw: &str) -> String {
    raw.chars()
        .take(19)
        .filter(|c| *c != '-' && *c != ':')
        .collect()
}
