use serde::Deserialize;

/// A visible element that might be the menu entry
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MenuCandidate {
    pub index: usize,
    pub text: String,
    pub title: String,
    pub name: String,
    /// Tab attribute of the element or its nearest ancestor carrying one
    pub tab: Option<String>,
    /// No child element repeats the same text
    pub leaf: bool,
}

impl MenuCandidate {
    fn labels(&self) -> [&str; 3] {
        [&self.text, &self.title, &self.name]
    }
}

fn normalize(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Pick the entry to click for `label`
///
/// Exact matches win over partial ones; among exact matches the innermost
/// element is preferred so the click lands on the element with the handler.
pub fn pick_menu<'a>(candidates: &'a [MenuCandidate], label: &str) -> Option<&'a MenuCandidate> {
    let wanted = normalize(label);
    if wanted.is_empty() {
        return None;
    }
    let exact = |c: &&MenuCandidate| c.labels().iter().any(|l| normalize(l) == wanted);

    candidates
        .iter()
        .filter(exact)
        .find(|c| c.leaf)
        .or_else(|| candidates.iter().find(exact))
        .or_else(|| {
            candidates
                .iter()
                .find(|c| c.labels().iter().any(|l| normalize(l).contains(&wanted)))
        })
}
