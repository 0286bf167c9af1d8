use findex_core::traits::Classifier;

pub const DEFAULT_TOPIC: &str = "General";
pub const DEFAULT_CATEGORY: &str = "Document";

/// One classification rule: the first rule whose trigger phrase occurs in
/// the input wins. Rules are data; swapping the label set never touches
/// callers.
#[derive(Debug, Clone)]
pub struct Rule {
    pub label: String,
    pub triggers: Vec<String>,
}

impl Rule {
    pub fn new(label: &str, triggers: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            triggers: triggers.iter().map(|t| t.to_lowercase()).collect(),
        }
    }

    fn matches(&self, lowered: &str) -> bool {
        self.triggers.iter().any(|t| lowered.contains(t.as_str()))
    }
}

/// Substring-trigger classifier with a fixed priority order.
///
/// Text and filenames are lower-cased before matching; rules are evaluated
/// in list order and the first match wins, so overlapping trigger sets are
/// deterministic.
pub struct RuleBasedClassifier {
    topic_rules: Vec<Rule>,
    name_rules: Vec<Rule>,
    default_topic: String,
    default_category: String,
}

impl RuleBasedClassifier {
    pub fn new(topic_rules: Vec<Rule>, name_rules: Vec<Rule>) -> Self {
        Self {
            topic_rules,
            name_rules,
            default_topic: DEFAULT_TOPIC.to_string(),
            default_category: DEFAULT_CATEGORY.to_string(),
        }
    }

    fn first_match<'a>(rules: &'a [Rule], input: &str, fallback: &'a str) -> &'a str {
        let lowered = input.to_lowercase();
        rules
            .iter()
            .find(|r| r.matches(&lowered))
            .map(|r| r.label.as_str())
            .unwrap_or(fallback)
    }
}

impl Default for RuleBasedClassifier {
    /// The shipped rule set. Topic labels and their trigger phrases follow
    /// common personal-document folders; priority is the list order.
    fn default() -> Self {
        let topic_rules = vec![
            Rule::new(
                "Education",
                &["exam", "syllabus", "lecture", "university", "college"],
            ),
            Rule::new(
                "Finance",
                &["invoice", "salary", "tax", "bank", "payment"],
            ),
            Rule::new(
                "Technology",
                &[
                    "python",
                    "java",
                    "algorithm",
                    "database",
                    "machine learning",
                    "neural network",
                    "software",
                ],
            ),
        ];
        let name_rules = vec![
            Rule::new("Invoice", &["invoice", "receipt"]),
            Rule::new("Report", &["report"]),
            Rule::new("Notes", &["note"]),
            Rule::new("Resume", &["resume", "cv"]),
            Rule::new("Presentation", &["slides", "presentation", "deck"]),
        ];
        Self::new(topic_rules, name_rules)
    }
}

impl Classifier for RuleBasedClassifier {
    fn classify(&self, text: &str) -> String {
        Self::first_match(&self.topic_rules, text, &self.default_topic).to_string()
    }

    fn classify_name(&self, filename: &str) -> String {
        Self::first_match(&self.name_rules, filename, &self.default_category).to_string()
    }
}
