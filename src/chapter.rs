/// Campaign chapters and the carried score.
use bevy::prelude::*;
use strum::EnumIter;

/// The fixed campaign order. Playable chapters advance front to back; the
/// last one routes to the finale, as does a defeat from anywhere.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States, EnumIter)]
pub enum Chapter {
    #[default]
    Title,
    Briefing,
    Vestibule,
    Miasma,
    Seance,
    Archive,
    Finale,
}

impl Chapter {
    pub fn is_playable(self) -> bool {
        matches!(
            self,
            Chapter::Vestibule | Chapter::Miasma | Chapter::Seance | Chapter::Archive
        )
    }

    /// Successor in the campaign. Only meaningful for playable chapters.
    pub fn next(self) -> Chapter {
        match self {
            Chapter::Vestibule => Chapter::Miasma,
            Chapter::Miasma => Chapter::Seance,
            Chapter::Seance => Chapter::Archive,
            _ => Chapter::Finale,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Chapter::Vestibule => "I",
            Chapter::Miasma => "II",
            Chapter::Seance => "III",
            Chapter::Archive => "IV",
            _ => "",
        }
    }
}

/// Cumulative shooting-gallery score, carried with the meters across
/// chapter transitions and shown on the finale screen.
#[derive(Resource, Default)]
pub struct Score(pub u32);

/// Named system sets for the per-tick gameplay pipeline. Collision effects
/// must land before the clamp/HUD pass, so the sets run chained.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlaySet {
    Input,
    Motion,
    Resolve,
    Present,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn campaign_order_ends_at_finale() {
        let mut chapter = Chapter::Vestibule;
        let mut visited = vec![chapter];
        while chapter.is_playable() {
            chapter = chapter.next();
            visited.push(chapter);
        }
        assert_eq!(
            visited,
            vec![
                Chapter::Vestibule,
                Chapter::Miasma,
                Chapter::Seance,
                Chapter::Archive,
                Chapter::Finale,
            ]
        );
    }

    #[test]
    fn menu_chapters_are_not_playable() {
        assert!(!Chapter::Title.is_playable());
        assert!(!Chapter::Briefing.is_playable());
        assert!(!Chapter::Finale.is_playable());
    }
}
