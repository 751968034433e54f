//! The built-in RetroDesk mystery: patterns, clues and access codes.

use retrodesk_domain::{
    AccessLevel, ActionFilter, Clue, ClueCategory, ClueDisplay, ClueId, ClueTitle, Description,
    DomainError, FeatureKey, FileOperation, MatchRule, PatternDefinition, PatternEffect,
    PatternId, PatternName, PatternType, TextMatch, VisualRepresentation,
};

use super::clues::{AccessCode, ClueCatalogue};
use super::registry::PatternRegistry;

pub const ADMIN_SEQUENCE: &str = "admin-password-then-admin-command";
pub const STARFIELD_CARTOGRAPHER: &str = "starfield-cartographer";
pub const SIGNAL_DECODER: &str = "signal-decoder";
pub const JOURNAL_READER: &str = "journal-reader";
pub const DOS_SECRET: &str = "dos-secret";

/// Static content loaded once at startup
#[derive(Debug, Clone)]
pub struct Catalogue {
    pub patterns: PatternRegistry,
    pub clues: ClueCatalogue,
}

impl Catalogue {
    /// # Errors
    ///
    /// `DomainError::Constraint` when a pattern reveals a clue the clue
    /// catalogue does not define.
    pub fn new(patterns: PatternRegistry, clues: ClueCatalogue) -> Result<Self, DomainError> {
        for pattern in patterns.all_patterns() {
            if let Some(missing) = pattern.revealed_clues().find(|id| !clues.contains(id.as_str())) {
                return Err(DomainError::constraint(format!(
                    "Pattern {} reveals unknown clue {}",
                    pattern.id, missing
                )));
            }
        }
        Ok(Self { patterns, clues })
    }

    pub fn standard() -> Result<Self, DomainError> {
        Self::new(
            PatternRegistry::new(standard_patterns()?)?,
            ClueCatalogue::new(standard_clues()?, standard_access_codes()?)?,
        )
    }
}

fn pattern(id: &str, name: &str, rule: MatchRule) -> Result<PatternDefinition, DomainError> {
    PatternDefinition::new(PatternId::new(id)?, PatternName::new(name)?, rule)
}

fn reveal(clue_id: &str) -> Result<PatternEffect, DomainError> {
    Ok(PatternEffect::RevealClue {
        clue_id: ClueId::new(clue_id)?,
    })
}

fn standard_patterns() -> Result<Vec<PatternDefinition>, DomainError> {
    Ok(vec![
        pattern(
            ADMIN_SEQUENCE,
            "Forgotten Backup",
            MatchRule::sequence(
                vec![
                    ActionFilter::file_access(
                        TextMatch::exact("/system/backup/admin.bak"),
                        Some(FileOperation::Open),
                    ),
                    ActionFilter::command(TextMatch::exact("admin THX1138")),
                ],
                10,
            ),
        )?
        .with_description(Description::new(
            "Someone left the admin password in a backup file.",
        )?)
        .with_type(PatternType::Sequence)
        .with_thresholds(vec![0.5])?
        .with_visual(VisualRepresentation::icon("key").with_color("#ffcc00"))
        .with_effect(reveal("admin-access")?)
        .with_effect(PatternEffect::RaiseAccess {
            level: AccessLevel::Admin,
        }),
        pattern(
            STARFIELD_CARTOGRAPHER,
            "Starfield Cartographer",
            MatchRule::threshold(ActionFilter::click_in("starfield"), 4),
        )?
        .with_description(Description::new("Some of those stars are not stars.")?)
        .with_type(PatternType::Exploration)
        .with_thresholds(vec![0.25, 0.5, 0.75])?
        .with_visual(
            VisualRepresentation::icon("star")
                .with_color("#88aaff")
                .with_animation("twinkle"),
        )
        .with_effect(reveal("star-chart")?),
        pattern(
            SIGNAL_DECODER,
            "Signal in the Noise",
            MatchRule::all_within(
                vec![
                    ActionFilter::app("radio", Some("tuned")),
                    ActionFilter::command(TextMatch::contains("decode")),
                ],
                60_000,
            ),
        )?
        .with_type(PatternType::Temporal)
        .with_visual(VisualRepresentation::icon("antenna").with_animation("pulse"))
        .with_effect(reveal("signal-fragment")?)
        .with_effect(PatternEffect::UnlockFeature {
            feature: FeatureKey::new("hidden_terminal_commands")?,
        }),
        pattern(
            JOURNAL_READER,
            "Between the Lines",
            MatchRule::distinct_threshold(
                ActionFilter::file_access(TextMatch::prefix("/home/user/journal/"), None),
                3,
            ),
        )?
        .with_type(PatternType::Exploration)
        .with_thresholds(vec![0.33, 0.66])?
        .with_effect(reveal("journal-gap")?)
        .with_effect(PatternEffect::RaiseAccess {
            level: AccessLevel::User,
        }),
        pattern(
            DOS_SECRET,
            "Old Habits",
            MatchRule::threshold(ActionFilter::kind("doom_secret_found"), 1),
        )?
        .with_type(PatternType::EasterEgg)
        .with_effect(reveal("iddqd-note")?),
    ])
}

fn clue(
    id: &str,
    title: &str,
    category: ClueCategory,
    content: &str,
) -> Result<Clue, DomainError> {
    Ok(Clue::new(ClueId::new(id)?, ClueTitle::new(title)?, category, content))
}

fn standard_clues() -> Result<Vec<Clue>, DomainError> {
    Ok(vec![
        clue(
            "admin-access",
            "Administrator Session",
            ClueCategory::SystemLog,
            "root session opened from tty1. Previous admin last seen 1997-03-14.",
        )?
        .with_display(ClueDisplay::Important),
        clue(
            "star-chart",
            "Star Chart",
            ClueCategory::HiddenFile,
            "The clicked stars trace a constellation that does not exist.",
        )?
        .with_display(ClueDisplay::Secret),
        clue(
            "signal-fragment",
            "Signal Fragment",
            ClueCategory::Metadata,
            "Carrier wave decoded: 'THEY ARE STILL IN THE MACHINE'.",
        )?
        .with_display(ClueDisplay::Important),
        clue(
            "journal-gap",
            "Missing Week",
            ClueCategory::Journal,
            "The journal skips from March 7 to March 15 without comment.",
        )?,
        clue(
            "iddqd-note",
            "Cheat Codes",
            ClueCategory::Email,
            "Fwd: fwd: the god mode code works on the lab machines too",
        )?
        .as_red_herring(),
        clue(
            "guest-login",
            "Guest Account",
            ClueCategory::SystemLog,
            "guest logged in. Home directory: /home/user",
        )?,
    ])
}

fn standard_access_codes() -> Result<Vec<AccessCode>, DomainError> {
    Ok(vec![
        AccessCode::new("guest", AccessLevel::User).revealing(ClueId::new("guest-login")?),
        AccessCode::new("THX1138", AccessLevel::Admin).revealing(ClueId::new("admin-access")?),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalogue_is_valid() {
        let catalogue = Catalogue::standard().unwrap();
        assert_eq!(catalogue.patterns.len(), 5);
        assert_eq!(
            catalogue.patterns.all_patterns()[0].id.as_str(),
            ADMIN_SEQUENCE
        );
        assert!(catalogue.clues.contains("admin-access"));
        assert!(catalogue.clues.get_clue("iddqd-note").unwrap().red_herring);
    }

    #[test]
    fn rejects_reveal_of_unknown_clue() {
        let patterns = PatternRegistry::new(vec![pattern(
            "p",
            "P",
            MatchRule::threshold(ActionFilter::click_in("x"), 1),
        )
        .unwrap()
        .with_effect(reveal("ghost").unwrap())])
        .unwrap();
        let result = Catalogue::new(patterns, ClueCatalogue::default());
        assert!(matches!(result, Err(DomainError::Constraint(_))));
    }
}
