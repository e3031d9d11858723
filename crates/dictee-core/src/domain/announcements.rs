//! Narrated phase announcements and the pre-generation segment list.

use crate::domain::Dictation;
use crate::text::{count_signs, spoken_form_or_raw, split_into_sentences};

const DICTEE_ANNOUNCEMENT: &str = "Phase deux. Dictée. Chaque phrase sera lue deux fois, en marquant \
     et en annonçant la ponctuation. Écrivez pendant la dictée, puis relisez chaque phrase.";

const RELECTURE_ANNOUNCEMENT: &str = "Phase trois. Relecture. Le texte est relu une dernière fois, \
     de façon continue, sans annoncer la ponctuation, pour vérifier et corriger votre copie.";

/// The three texts read at the start of each narrated phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseAnnouncements {
    pub lecture1: String,
    pub dictee: String,
    pub relecture: String,
}

impl PhaseAnnouncements {
    #[must_use]
    pub fn for_dictation(dictation: &Dictation) -> Self {
        let lecture1 = format!(
            "Phase un. Lecture intégrale. Écoutez le texte sans écrire. Le texte s'intitule {}, \
             de {}, environ {} signes sans les espaces. {}",
            dictation.title,
            dictation.author,
            count_signs(&dictation.text),
            key_points(dictation),
        );

        Self {
            lecture1: lecture1.trim_end().to_string(),
            dictee: DICTEE_ANNOUNCEMENT.to_string(),
            relecture: RELECTURE_ANNOUNCEMENT.to_string(),
        }
    }
}

/// Every text a full run narrates, in the order the run needs them.
///
/// Phase-1 announcement, full text, phase-2 announcement, the spoken form of
/// each sentence, phase-3 announcement. The relecture reading of the full
/// text reuses the second entry.
#[must_use]
pub fn pregeneration_segments(dictation: &Dictation) -> Vec<String> {
    let announcements = PhaseAnnouncements::for_dictation(dictation);
    let sentences = split_into_sentences(&dictation.text);

    let mut segments = Vec::with_capacity(sentences.len() + 4);
    segments.push(announcements.lecture1);
    segments.push(dictation.text.clone());
    segments.push(announcements.dictee);
    segments.extend(sentences.iter().map(|s| spoken_form_or_raw(s)));
    segments.push(announcements.relecture);
    segments
}

/// "Points clés : ... mots à surveiller : ..." built from the first two
/// distinct rule categories and the first two rule words.
fn key_points(dictation: &Dictation) -> String {
    let mut categories = Vec::new();
    for rule in &dictation.rules {
        if !categories.contains(&rule.category) {
            categories.push(rule.category);
        }
    }
    let labels: Vec<&str> = categories.iter().take(2).map(|c| c.spoken_label()).collect();

    let focus_words: Vec<String> = dictation
        .rules
        .iter()
        .take(2)
        .map(|rule| rule.word.replace(['«', '»', '"'], "").trim().to_string())
        .filter(|word| !word.is_empty())
        .collect();

    let mut parts = Vec::new();
    if !labels.is_empty() {
        parts.push(format!("Points clés : {}", labels.join(" et ")));
    }
    if !focus_words.is_empty() {
        parts.push(format!("mots à surveiller : {}", focus_words.join(", ")));
    }

    if parts.is_empty() {
        String::new()
    } else {
        format!("{}.", parts.join(". "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GrammarRule, RuleCategory};

    fn dictation(rules: Vec<GrammarRule>) -> Dictation {
        Dictation {
            id: 7,
            title: "La mer".into(),
            author: "Victor Hugo".into(),
            work: None,
            year: None,
            theme: None,
            difficulty: 1,
            text: "La mer brillait. Les mouettes criaient, puis se taisaient.".into(),
            rules,
        }
    }

    fn rule(word: &str, category: RuleCategory) -> GrammarRule {
        GrammarRule {
            word: word.into(),
            category,
            explanation: String::new(),
        }
    }

    #[test]
    fn lecture1_announces_title_author_and_sign_count() {
        let ann = PhaseAnnouncements::for_dictation(&dictation(vec![]));
        assert!(ann.lecture1.contains("s'intitule La mer, de Victor Hugo"));
        assert!(ann.lecture1.contains("environ 50 signes sans les espaces."));
        assert!(ann.lecture1.ends_with("espaces."));
    }

    #[test]
    fn key_points_use_first_two_distinct_categories_and_words() {
        let d = dictation(vec![
            rule("« brillait »", RuleCategory::Conjugaison),
            rule("criaient", RuleCategory::Conjugaison),
            rule("se", RuleCategory::Homophones),
            rule("mouettes", RuleCategory::Accord),
        ]);
        let ann = PhaseAnnouncements::for_dictation(&d);
        assert!(
            ann.lecture1.ends_with(
                "Points clés : la conjugaison et les homophones. \
                 mots à surveiller : brillait, criaient."
            ),
            "{}",
            ann.lecture1
        );
    }

    #[test]
    fn segments_follow_run_order() {
        let d = dictation(vec![]);
        let segments = pregeneration_segments(&d);
        assert_eq!(segments.len(), 6);
        assert!(segments[0].starts_with("Phase un."));
        assert_eq!(segments[1], d.text);
        assert!(segments[2].starts_with("Phase deux."));
        assert_eq!(segments[3], "La mer brillait, point");
        assert_eq!(
            segments[4],
            "Les mouettes criaient, virgule, puis se taisaient, point"
        );
        assert!(segments[5].starts_with("Phase trois."));
    }
}
