//! Settings rows.
//!
//! A row shows either a text detail or a switch. [`SettingItem`] makes that
//! explicit so the presentation layer matches on the variant instead of
//! inspecting a loosely typed detail field.

use crate::preferences::Session;
use serde::{Deserialize, Serialize};

/// What tapping (or flipping) a row does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettingAction {
    Language,
    Theme,
    /// Cycle the displayed version.
    Version,
    About,
    /// Flip the named preference switch.
    Toggle(String),
}

/// One row of the settings screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettingItem {
    Text {
        title: String,
        detail: String,
        action: SettingAction,
    },
    Toggle {
        title: String,
        is_on: bool,
        action: SettingAction,
    },
}

impl SettingItem {
    pub fn title(&self) -> &str {
        match self {
            SettingItem::Text { title, .. } | SettingItem::Toggle { title, .. } => title,
        }
    }

    pub fn action(&self) -> &SettingAction {
        match self {
            SettingItem::Text { action, .. } | SettingItem::Toggle { action, .. } => action,
        }
    }
}

/// Version strings shown in the Version row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub app_name: String,
    pub app_version: String,
    pub build: String,
    pub whiteboard_version: String,
}

/// Which version the Version row currently shows. Tapping cycles through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayVersion {
    #[default]
    App,
    Whiteboard,
}

impl DisplayVersion {
    const ALL: [DisplayVersion; 2] = [DisplayVersion::App, DisplayVersion::Whiteboard];

    /// Next value, wrapping to the first.
    pub fn next(self) -> DisplayVersion {
        let i = Self::ALL.iter().position(|v| *v == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn describe(self, info: &VersionInfo) -> String {
        match self {
            DisplayVersion::App => {
                format!("{} v{} ({})", info.app_name, info.app_version, info.build)
            }
            DisplayVersion::Whiteboard => format!("Whiteboard v{}", info.whiteboard_version),
        }
    }
}

/// Inputs needed to build the rows.
#[derive(Debug, Clone)]
pub struct SettingsContext {
    /// Current language name, or `None` to follow the system.
    pub language: Option<String>,
    pub theme: String,
    pub version: VersionInfo,
    pub display_version: DisplayVersion,
    /// `(title, preference key)` for each switch row.
    pub toggles: Vec<(String, String)>,
}

/// Detail shown when no language was chosen.
pub const FOLLOW_SYSTEM: &str = "Follow system";

/// Rows in display order: language, theme, version, switches, about.
pub fn settings_rows(ctx: &SettingsContext, session: &Session<'_>) -> Vec<SettingItem> {
    let mut rows = vec![
        SettingItem::Text {
            title: "Language Setting".into(),
            detail: ctx
                .language
                .clone()
                .unwrap_or_else(|| FOLLOW_SYSTEM.to_string()),
            action: SettingAction::Language,
        },
        SettingItem::Text {
            title: "Theme".into(),
            detail: ctx.theme.clone(),
            action: SettingAction::Theme,
        },
        SettingItem::Text {
            title: "Version".into(),
            detail: ctx.display_version.describe(&ctx.version),
            action: SettingAction::Version,
        },
    ];

    rows.extend(ctx.toggles.iter().map(|(title, key)| SettingItem::Toggle {
        title: title.clone(),
        is_on: session.toggle(key),
        action: SettingAction::Toggle(key.clone()),
    }));

    rows.push(SettingItem::Text {
        title: "About".into(),
        detail: String::new(),
        action: SettingAction::About,
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::PreferenceStore;

    fn ctx() -> SettingsContext {
        SettingsContext {
            language: None,
            theme: "Dark".into(),
            version: VersionInfo {
                app_name: "Classroom".into(),
                app_version: "1.4.0".into(),
                build: "212".into(),
                whiteboard_version: "2.16.0".into(),
            },
            display_version: DisplayVersion::App,
            toggles: vec![("Low-bandwidth mode".into(), "low_bandwidth".into())],
        }
    }

    #[test]
    fn version_cycles() {
        assert_eq!(DisplayVersion::App.next(), DisplayVersion::Whiteboard);
        assert_eq!(DisplayVersion::Whiteboard.next(), DisplayVersion::App);
    }

    #[test]
    fn rows_in_order_with_variants() {
        let store = PreferenceStore::in_memory();
        let mut session = store.login("u1").unwrap();
        session.set_toggle("low_bandwidth", true);

        let rows = settings_rows(&ctx(), &session);
        let titles: Vec<&str> = rows.iter().map(SettingItem::title).collect();
        assert_eq!(
            titles,
            ["Language Setting", "Theme", "Version", "Low-bandwidth mode", "About"]
        );

        match &rows[0] {
            SettingItem::Text { detail, .. } => assert_eq!(detail, FOLLOW_SYSTEM),
            other => panic!("expected text row, got {other:?}"),
        }
        match &rows[2] {
            SettingItem::Text { detail, .. } => assert_eq!(detail, "Classroom v1.4.0 (212)"),
            other => panic!("expected text row, got {other:?}"),
        }
        match &rows[3] {
            SettingItem::Toggle { is_on, action, .. } => {
                assert!(*is_on);
                assert_eq!(action, &SettingAction::Toggle("low_bandwidth".into()));
            }
            other => panic!("expected toggle row, got {other:?}"),
        }
    }

    #[test]
    fn whiteboard_version_detail() {
        let mut c = ctx();
        c.display_version = c.display_version.next();
        assert_eq!(c.display_version.describe(&c.version), "Whiteboard v2.16.0");
    }
}
