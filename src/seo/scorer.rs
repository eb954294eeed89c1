use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::slugify;

pub const TITLE_MIN: usize = 30;
pub const TITLE_MAX: usize = 60;
pub const DESCRIPTION_MIN: usize = 120;
pub const DESCRIPTION_MAX: usize = 160;
pub const INTRO_WORDS: usize = 100;
pub const MIN_BODY_WORDS: usize = 300;
pub const DENSITY_MIN: f64 = 0.5;
pub const DENSITY_MAX: f64 = 2.5;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag regex"));
static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)(<h[2-6][\s>])|(^#{2,6}\s)").expect("heading regex"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SeoInput {
    pub title: String,
    pub description: String,
    pub url: String,
    pub body: String,
    pub keywords: Vec<String>,
    pub has_canonical: bool,
    pub indexable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoCheck {
    pub id: &'static str,
    pub passed: bool,
    pub points: u8,
    pub max_points: u8,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeoGrade {
    Good,
    NeedsWork,
    Poor,
}

impl SeoGrade {
    fn from_score(score: u8) -> Self {
        match score {
            80..=100 => SeoGrade::Good,
            50..=79 => SeoGrade::NeedsWork,
            _ => SeoGrade::Poor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoReport {
    pub score: u8,
    pub grade: SeoGrade,
    pub focus_keyword: Option<String>,
    pub word_count: usize,
    pub keyword_density: f64,
    pub checks: Vec<SeoCheck>,
}

fn check(id: &'static str, max_points: u8, passed: bool, message: String) -> SeoCheck {
    SeoCheck {
        id,
        passed,
        points: if passed { max_points } else { 0 },
        max_points,
        message,
    }
}

/// Visible words of an HTML or markdown body.
fn body_words(body: &str) -> Vec<String> {
    TAG_RE
        .replace_all(body, " ")
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect()
}

/// Whole-phrase matcher for one keyword, compiled once per score. A match must
/// sit between non-word characters (or the ends of the text), which also works
/// for keywords that start or end in punctuation such as "c++".
struct PhraseMatcher(Option<Regex>);

impl PhraseMatcher {
    fn new(phrase: &str) -> Self {
        let phrase = phrase.split_whitespace().collect::<Vec<_>>().join(" ");
        if phrase.is_empty() {
            return Self(None);
        }
        Self(Regex::new(&format!(r"(?:^|\W)({})(?:\W|$)", regex::escape(&phrase))).ok())
    }

    fn count(&self, text: &str) -> usize {
        let Some(re) = &self.0 else {
            return 0;
        };
        let mut count = 0;
        let mut at = 0;
        // resume at the end of the phrase so a shared separator can start the next match
        while let Some(found) = re.captures_at(text, at).and_then(|c| c.get(1)) {
            count += 1;
            at = found.end();
        }
        count
    }
}

/// Score a page out of 100. Each check is worth a fixed number of points.
pub fn score(input: &SeoInput) -> SeoReport {
    let focus = input
        .keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .find(|k| !k.is_empty());
    let title = input.title.trim().to_lowercase();
    let description = input.description.trim().to_lowercase();
    let url = input.url.to_lowercase();

    let words = body_words(&input.body);
    let word_count = words.len();
    let text = words.join(" ");
    let intro = words
        .iter()
        .take(INTRO_WORDS)
        .cloned()
        .collect::<Vec<_>>()
        .join(" ");

    let title_len = input.title.trim().chars().count();
    let description_len = input.description.trim().chars().count();

    let matcher = focus.as_deref().map(PhraseMatcher::new);
    let density = match (&focus, &matcher) {
        (Some(keyword), Some(matcher)) if word_count > 0 => {
            let keyword_words = keyword.split_whitespace().count();
            (matcher.count(&text) * keyword_words) as f64 / word_count as f64 * 100.0
        }
        _ => 0.0,
    };

    let mut checks = vec![
        check(
            "title_length",
            10,
            (TITLE_MIN..=TITLE_MAX).contains(&title_len),
            format!("Title is {} characters (aim for {}-{})", title_len, TITLE_MIN, TITLE_MAX),
        ),
        check(
            "description_length",
            10,
            (DESCRIPTION_MIN..=DESCRIPTION_MAX).contains(&description_len),
            format!(
                "Description is {} characters (aim for {}-{})",
                description_len, DESCRIPTION_MIN, DESCRIPTION_MAX
            ),
        ),
    ];

    match &focus {
        Some(keyword) => {
            let in_title = title.find(keyword.as_str());
            checks.push(check(
                "keyword_in_title",
                15,
                in_title.is_some(),
                format!("Focus keyword '{}' in title", keyword),
            ));
            checks.push(check(
                "keyword_title_position",
                5,
                in_title.map(|at| at <= title.len() / 2).unwrap_or(false),
                "Focus keyword appears in the first half of the title".to_string(),
            ));
            checks.push(check(
                "keyword_in_description",
                10,
                description.contains(keyword.as_str()),
                format!("Focus keyword '{}' in meta description", keyword),
            ));
            let keyword_slug = slugify(keyword);
            checks.push(check(
                "keyword_in_url",
                10,
                !keyword_slug.is_empty() && url.contains(&keyword_slug),
                format!("URL contains '{}'", keyword_slug),
            ));
            checks.push(check(
                "keyword_in_intro",
                10,
                matcher.as_ref().is_some_and(|m| m.count(&intro) > 0),
                format!("Focus keyword in the first {} words", INTRO_WORDS),
            ));
            checks.push(check(
                "keyword_density",
                10,
                (DENSITY_MIN..=DENSITY_MAX).contains(&density),
                format!(
                    "Keyword density is {:.2}% (aim for {}-{}%)",
                    density, DENSITY_MIN, DENSITY_MAX
                ),
            ));
        }
        None => {
            for (id, points) in [
                ("keyword_in_title", 15),
                ("keyword_title_position", 5),
                ("keyword_in_description", 10),
                ("keyword_in_url", 10),
                ("keyword_in_intro", 10),
                ("keyword_density", 10),
            ] {
                checks.push(check(id, points, false, "No focus keyword set".to_string()));
            }
        }
    }

    checks.push(check(
        "has_headings",
        5,
        HEADING_RE.is_match(&input.body),
        "Content uses subheadings".to_string(),
    ));
    checks.push(check(
        "content_length",
        5,
        word_count >= MIN_BODY_WORDS,
        format!("Content has {} words (aim for {}+)", word_count, MIN_BODY_WORDS),
    ));
    checks.push(check(
        "canonical",
        5,
        input.has_canonical,
        "Canonical URL is set".to_string(),
    ));
    checks.push(check(
        "indexable",
        5,
        input.indexable,
        "Robots directives allow indexing".to_string(),
    ));

    let total: u32 = checks.iter().map(|c| u32::from(c.points)).sum();
    let score = total.min(100) as u8;

    SeoReport {
        score,
        grade: SeoGrade::from_score(score),
        focus_keyword: focus,
        word_count,
        keyword_density: (density * 100.0).round() / 100.0,
        checks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn optimised_input() -> SeoInput {
        let body = format!(
            "## How the gratuity calculator works\n{} gratuity calculator {}",
            vec!["word"; 300].join(" "),
            vec!["word"; 40].join(" ")
        );
        SeoInput {
            title: "Gratuity Calculator UAE: Work Out Your End of Service Pay".to_string(),
            description: "Use our free gratuity calculator to estimate UAE end of service benefits under the labour law, including DIFC and ADGM rules.".to_string(),
            url: "https://gratuitycalculator.ae/gratuity-calculator".to_string(),
            body,
            keywords: vec!["Gratuity Calculator".to_string()],
            has_canonical: true,
            indexable: true,
        }
    }

    #[test]
    fn test_checks_sum_to_one_hundred() {
        let report = score(&optimised_input());
        let max: u32 = report.checks.iter().map(|c| u32::from(c.max_points)).sum();
        assert_eq!(max, 100);
        assert_eq!(report.checks.len(), 12);
    }

    #[test]
    fn test_fully_optimised_page_scores_full_marks() {
        let report = score(&optimised_input());
        let failed: Vec<_> = report.checks.iter().filter(|c| !c.passed).map(|c| c.id).collect();
        assert!(failed.is_empty(), "failed checks: {:?}", failed);
        assert_eq!(report.score, 100);
        assert_eq!(report.grade, SeoGrade::Good);
        assert_eq!(report.word_count, 348);
        assert_eq!(report.focus_keyword.as_deref(), Some("gratuity calculator"));
    }

    #[test]
    fn test_empty_input_scores_zero() {
        let report = score(&SeoInput::default());
        assert_eq!(report.score, 0);
        assert_eq!(report.grade, SeoGrade::Poor);
    }

    #[test]
    fn test_score_never_drops_as_checks_pass() {
        let full = optimised_input();
        let steps: Vec<Box<dyn Fn(&mut SeoInput) + '_>> = vec![
            Box::new(|i| i.keywords = full.keywords.clone()),
            Box::new(|i| i.title = full.title.clone()),
            Box::new(|i| i.description = full.description.clone()),
            Box::new(|i| i.url = full.url.clone()),
            Box::new(|i| i.body = full.body.clone()),
            Box::new(|i| i.has_canonical = true),
            Box::new(|i| i.indexable = true),
        ];

        let mut input = SeoInput::default();
        let mut previous = score(&input).score;
        for step in steps {
            step(&mut input);
            let current = score(&input).score;
            assert!(current >= previous);
            assert!(current <= 100);
            previous = current;
        }
        assert_eq!(previous, 100);
    }

    #[test]
    fn test_keyword_stuffing_fails_density() {
        let mut input = optimised_input();
        input.body = vec!["gratuity calculator"; 200].join(" ");
        let report = score(&input);
        let density = report.checks.iter().find(|c| c.id == "keyword_density").unwrap();
        assert!(!density.passed);
        assert_eq!(report.keyword_density, 100.0);
    }

    #[test]
    fn test_html_body_headings_and_tags() {
        let mut input = optimised_input();
        input.body = "<h3 class=\"x\">FAQ</h3><p>gratuity calculator</p>".to_string();
        let report = score(&input);
        assert!(report.checks.iter().any(|c| c.id == "has_headings" && c.passed));
        assert_eq!(report.word_count, 3);
    }

    #[test]
    fn test_keyword_matches_whole_words_only() {
        let mut input = optimised_input();
        input.keywords = vec!["tax".to_string()];
        input.body = "taxes and taxation".to_string();
        let report = score(&input);
        assert!(report
            .checks
            .iter()
            .any(|c| c.id == "keyword_in_intro" && !c.passed));
    }

    #[test]
    fn test_phrase_matcher_counts_adjacent_repeats() {
        let matcher = PhraseMatcher::new("tax");
        assert_eq!(matcher.count("tax tax tax"), 3);
        assert_eq!(matcher.count("tax, taxes and tax."), 2);
        assert_eq!(PhraseMatcher::new("end  of service").count("end of service end of service"), 2);
        assert_eq!(PhraseMatcher::new("   ").count("anything"), 0);
    }

    #[test]
    fn test_phrase_matcher_handles_punctuated_keywords() {
        assert_eq!(PhraseMatcher::new("c++").count("learn c++ and c++, not c++x"), 2);
        assert_eq!(PhraseMatcher::new("aed.").count("paid 500 aed. per month"), 1);

        let mut input = optimised_input();
        input.keywords = vec!["c++".to_string()];
        input.body = "c++ developers in dubai earn gratuity too".to_string();
        let report = score(&input);
        assert!(report
            .checks
            .iter()
            .any(|c| c.id == "keyword_in_intro" && c.passed));
    }
}
