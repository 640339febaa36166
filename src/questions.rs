use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

pub const QUESTION_HEADERS: [&str; 6] = [
    "question",
    "option_a",
    "option_b",
    "option_c",
    "option_d",
    "correct_answer",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Letter {
    A,
    B,
    C,
    D,
}

impl Letter {
    pub const ALL: [Letter; 4] = [Letter::A, Letter::B, Letter::C, Letter::D];

    pub fn as_str(self) -> &'static str {
        match self {
            Letter::A => "A",
            Letter::B => "B",
            Letter::C => "C",
            Letter::D => "D",
        }
    }

    fn index(self) -> usize {
        match self {
            Letter::A => 0,
            Letter::B => 1,
            Letter::C => 2,
            Letter::D => 3,
        }
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLetterError(pub String);

impl fmt::Display for ParseLetterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected one of A, B, C, D, got {:?}", self.0)
    }
}

impl std::error::Error for ParseLetterError {}

impl FromStr for Letter {
    type Err = ParseLetterError;

    /// Trims and ignores case: `" b "` parses as `B`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Letter::A),
            "B" => Ok(Letter::B),
            "C" => Ok(Letter::C),
            "D" => Ok(Letter::D),
            _ => Err(ParseLetterError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub text: String,
    pub options: [String; 4],
    pub correct_answer: Letter,
}

impl Question {
    pub fn option(&self, letter: Letter) -> &str {
        &self.options[letter.index()]
    }

    pub fn correct_text(&self) -> &str {
        self.option(self.correct_answer)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("invalid subject: {0:?}")]
    InvalidSubject(String),
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl SourceError {
    pub fn code(&self) -> &'static str {
        match self {
            SourceError::NotFound(_) => "not_found",
            SourceError::InvalidSubject(_) => "invalid_subject",
            SourceError::Read { .. } | SourceError::Io { .. } => "load_failed",
            SourceError::Write { .. } => "seed_failed",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Subject {
    pub id: &'static str,
    pub title: &'static str,
}

pub const SUBJECTS: [Subject; 4] = [
    Subject {
        id: "math",
        title: "Math",
    },
    Subject {
        id: "english",
        title: "English",
    },
    Subject {
        id: "science",
        title: "Science",
    },
    Subject {
        id: "kiswahili",
        title: "Kiswahili",
    },
];

/// Subject ids become file names, so only `[a-z0-9_-]` is accepted.
pub fn normalize_subject(raw: &str) -> Result<String, SourceError> {
    let s = raw.trim().to_ascii_lowercase();
    let valid = !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if valid {
        Ok(s)
    } else {
        Err(SourceError::InvalidSubject(raw.to_string()))
    }
}

/// `"Grade 5"` -> `"grade_5"`.
pub fn grade_slug(grade: &str) -> String {
    let mut out = String::new();
    let mut pending_sep = false;
    for c in grade.trim().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

pub struct QuestionBank {
    root: PathBuf,
}

#[derive(Debug)]
pub struct LoadedPool {
    pub questions: Vec<Question>,
    pub path: PathBuf,
    pub seeded: bool,
}

impl QuestionBank {
    pub fn new(quizzes_dir: &Path) -> Self {
        Self {
            root: quizzes_dir.to_path_buf(),
        }
    }

    pub fn grade_path(&self, grade: &str, subject: &str) -> PathBuf {
        self.root
            .join(grade_slug(grade))
            .join(format!("{}.csv", subject))
    }

    pub fn flat_path(&self, subject: &str) -> PathBuf {
        self.root.join(format!("{}.csv", subject))
    }

    pub fn locate(&self, grade: &str, subject: &str) -> Option<PathBuf> {
        let per_grade = self.grade_path(grade, subject);
        if per_grade.is_file() {
            return Some(per_grade);
        }
        let flat = self.flat_path(subject);
        if flat.is_file() {
            return Some(flat);
        }
        None
    }

    pub fn load(&self, grade: &str, subject: &str) -> Result<(Vec<Question>, PathBuf), SourceError> {
        let subject = normalize_subject(subject)?;
        let Some(path) = self.locate(grade, &subject) else {
            return Err(SourceError::NotFound(format!(
                "quiz file for {} ({})",
                subject, grade
            )));
        };
        let file = std::fs::File::open(&path).map_err(|e| SourceError::Io {
            path: path.clone(),
            source: e,
        })?;
        let questions = parse_questions(file, &path).map_err(|e| SourceError::Read {
            path: path.clone(),
            source: e,
        })?;
        debug!(path = %path.display(), count = questions.len(), "loaded question pool");
        Ok((questions, path))
    }

    /// Loads the pool, writing the built-in sample set and retrying once when
    /// the file is missing and `seed` is set.
    pub fn load_or_seed(
        &self,
        grade: &str,
        subject: &str,
        seed: bool,
    ) -> Result<LoadedPool, SourceError> {
        match self.load(grade, subject) {
            Ok((questions, path)) => Ok(LoadedPool {
                questions,
                path,
                seeded: false,
            }),
            Err(SourceError::NotFound(what)) => {
                if !seed || sample_questions(&normalize_subject(subject)?).is_none() {
                    return Err(SourceError::NotFound(what));
                }
                let written = self.write_sample(grade, subject)?;
                warn!(path = %written.display(), "quiz file missing; wrote built-in sample set");
                let (questions, path) = self.load(grade, subject)?;
                Ok(LoadedPool {
                    questions,
                    path,
                    seeded: true,
                })
            }
            Err(e) => Err(e),
        }
    }

    pub fn write_sample(&self, grade: &str, subject: &str) -> Result<PathBuf, SourceError> {
        let subject = normalize_subject(subject)?;
        let path = self.grade_path(grade, &subject);
        let Some(rows) = sample_questions(&subject) else {
            return Err(SourceError::NotFound(format!("built-in sample for {}", subject)));
        };
        write_questions(&path, &rows).map_err(|e| SourceError::Write {
            path: path.clone(),
            source: e,
        })?;
        Ok(path)
    }
}

pub fn write_questions(path: &Path, rows: &[Question]) -> Result<(), csv::Error> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut w = csv::Writer::from_path(path)?;
    w.write_record(QUESTION_HEADERS)?;
    for q in rows {
        w.write_record([
            q.text.as_str(),
            q.options[0].as_str(),
            q.options[1].as_str(),
            q.options[2].as_str(),
            q.options[3].as_str(),
            q.correct_answer.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

fn header_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').trim().eq_ignore_ascii_case(name))
}

/// Rows that cannot form a complete question are skipped with a warning.
/// Missing required headers give an empty pool rather than an error.
pub fn parse_questions<R: io::Read>(input: R, origin: &Path) -> Result<Vec<Question>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);
    let headers = reader.headers()?.clone();

    let mut cols = [0usize; 6];
    for (slot, name) in cols.iter_mut().zip(QUESTION_HEADERS) {
        let Some(i) = header_index(&headers, name) else {
            warn!(path = %origin.display(), column = name, "question file missing column");
            return Ok(Vec::new());
        };
        *slot = i;
    }

    let mut out = Vec::new();
    for (i, rec) in reader.records().enumerate() {
        // Header is line 1.
        let line = i + 2;
        let rec = match rec {
            Ok(r) => r,
            Err(e) => {
                warn!(path = %origin.display(), line, error = %e, "skipping unreadable row");
                continue;
            }
        };
        let field = |c: usize| rec.get(c).unwrap_or("").to_string();

        let text = field(cols[0]);
        if text.is_empty() {
            warn!(path = %origin.display(), line, "skipping row without question text");
            continue;
        }
        let options = [field(cols[1]), field(cols[2]), field(cols[3]), field(cols[4])];
        if options.iter().any(|o| o.is_empty()) {
            warn!(path = %origin.display(), line, "skipping row with a missing option");
            continue;
        }
        let correct_answer = match field(cols[5]).parse::<Letter>() {
            Ok(l) => l,
            Err(e) => {
                warn!(path = %origin.display(), line, error = %e, "skipping row with bad correct_answer");
                continue;
            }
        };
        out.push(Question {
            text,
            options,
            correct_answer,
        });
    }
    Ok(out)
}

fn q(text: &str, options: [&str; 4], correct_answer: Letter) -> Question {
    Question {
        text: text.to_string(),
        options: options.map(str::to_string),
        correct_answer,
    }
}

pub fn sample_questions(subject: &str) -> Option<Vec<Question>> {
    use Letter::*;
    let rows = match subject {
        "math" => vec![
            q("What is 7 + 5?", ["10", "11", "12", "13"], C),
            q("What is 9 x 6?", ["54", "45", "56", "63"], A),
            q("What is half of 48?", ["22", "24", "26", "28"], B),
            q("Which number is prime?", ["9", "15", "21", "13"], D),
            q("What is 100 - 37?", ["63", "73", "67", "53"], A),
        ],
        "english" => vec![
            q("Which word is a noun?", ["run", "happy", "table", "quickly"], C),
            q("What is the plural of 'child'?", ["childs", "children", "childes", "child"], B),
            q("Choose the correct spelling.", ["recieve", "receive", "receeve", "riceive"], B),
            q("Which word is the opposite of 'hot'?", ["warm", "cold", "dry", "wet"], B),
            q("Which sentence is a question?", ["I am here.", "Close the door.", "Where are you?", "What a day!"], C),
        ],
        "science" => vec![
            q("Which planet do we live on?", ["Mars", "Venus", "Earth", "Jupiter"], C),
            q("What do plants need to make food?", ["Sunlight", "Sand", "Salt", "Smoke"], A),
            q("Water freezes at what temperature (Celsius)?", ["10", "0", "100", "-10"], B),
            q("Which organ pumps blood?", ["Lungs", "Liver", "Heart", "Kidney"], C),
            q("Which of these is a mammal?", ["Shark", "Frog", "Eagle", "Cow"], D),
        ],
        "kiswahili" => vec![
            q("What is the Kiswahili word for 'water'?", ["Moto", "Maji", "Chakula", "Nyumba"], B),
            q("'Habari gani?' means:", ["Good night", "Thank you", "What news?", "Goodbye"], C),
            q("What is the Kiswahili word for 'school'?", ["Shule", "Soko", "Kanisa", "Hospitali"], A),
            q("'Asante' means:", ["Please", "Sorry", "Hello", "Thank you"], D),
            q("What is 'tatu' in English?", ["One", "Two", "Three", "Four"], C),
        ],
        _ => return None,
    };
    Some(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(prefix: &str) -> PathBuf {
        let p = std::env::temp_dir().join(format!(
            "{}-{}",
            prefix,
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        std::fs::create_dir_all(&p).expect("create temp dir");
        p
    }

    #[test]
    fn letter_parse_is_trimmed_and_case_insensitive() {
        assert_eq!("b".parse::<Letter>(), Ok(Letter::B));
        assert_eq!("  D ".parse::<Letter>(), Ok(Letter::D));
        assert!("E".parse::<Letter>().is_err());
        assert!("".parse::<Letter>().is_err());
        assert!("AB".parse::<Letter>().is_err());
    }

    #[test]
    fn grade_slug_collapses_separators() {
        assert_eq!(grade_slug("Grade 5"), "grade_5");
        assert_eq!(grade_slug("  Form  2 / East "), "form_2_east");
        assert_eq!(grade_slug("P7"), "p7");
    }

    #[test]
    fn normalize_subject_rejects_paths() {
        assert_eq!(normalize_subject(" Math ").expect("math"), "math");
        assert!(normalize_subject("../etc").is_err());
        assert!(normalize_subject("").is_err());
    }

    #[test]
    fn parse_skips_malformed_rows() {
        let text = "\u{feff}Question,option_a,option_b,option_c,option_d,Correct_Answer\n\
                    What is 2+2?,3,4,5,6,b\n\
                    ,1,2,3,4,A\n\
                    Missing option?,1,2,,4,A\n\
                    Bad letter?,1,2,3,4,E\n\
                    \"Comma, inside\",x,y,z,w, d \n";
        let qs = parse_questions(text.as_bytes(), Path::new("mem.csv")).expect("parse");
        assert_eq!(qs.len(), 2);
        assert_eq!(qs[0].correct_answer, Letter::B);
        assert_eq!(qs[0].correct_text(), "4");
        assert_eq!(qs[1].text, "Comma, inside");
        assert_eq!(qs[1].correct_answer, Letter::D);
    }

    #[test]
    fn parse_missing_header_yields_empty_pool() {
        let text = "question,option_a,option_b,option_c,answer\nQ,1,2,3,A\n";
        let qs = parse_questions(text.as_bytes(), Path::new("mem.csv")).expect("parse");
        assert!(qs.is_empty());
    }

    #[test]
    fn load_prefers_grade_file_then_flat_file() {
        let root = temp_dir("quizd-bank");
        let bank = QuestionBank::new(&root);

        let flat = vec![q("Flat?", ["a", "b", "c", "d"], Letter::A)];
        write_questions(&bank.flat_path("math"), &flat).expect("write flat");
        let (qs, path) = bank.load("Grade 5", "math").expect("load flat");
        assert_eq!(qs[0].text, "Flat?");
        assert_eq!(path, bank.flat_path("math"));

        let graded = vec![q("Graded?", ["a", "b", "c", "d"], Letter::B)];
        write_questions(&bank.grade_path("Grade 5", "math"), &graded).expect("write graded");
        let (qs, _) = bank.load("Grade 5", "math").expect("load graded");
        assert_eq!(qs[0].text, "Graded?");

        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn load_or_seed_writes_sample_once() {
        let root = temp_dir("quizd-seed");
        let bank = QuestionBank::new(&root);

        match bank.load_or_seed("Grade 4", "science", false) {
            Err(SourceError::NotFound(_)) => {}
            other => panic!("expected not found, got {:?}", other.map(|p| p.path)),
        }

        let pool = bank.load_or_seed("Grade 4", "science", true).expect("seed");
        assert!(pool.seeded);
        assert_eq!(pool.questions.len(), 5);
        assert_eq!(pool.path, bank.grade_path("Grade 4", "science"));

        let again = bank.load_or_seed("Grade 4", "science", true).expect("reload");
        assert!(!again.seeded);

        assert!(matches!(
            bank.load_or_seed("Grade 4", "history", true),
            Err(SourceError::NotFound(_))
        ));

        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn every_catalog_subject_has_a_sample() {
        for s in SUBJECTS {
            let rows = sample_questions(s.id).expect("sample");
            assert!(!rows.is_empty());
        }
    }
}
