use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub secret: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategorySetting {
    pub category_id: i64,
    pub setting_list: Vec<Setting>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginSettings {
    pub plugin_id: i64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Response of `GET /{project}/setting`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AllSetting {
    pub setting_list: Vec<Setting>,
    pub category_setting_list: Vec<CategorySetting>,
    pub plugin_settings_list: Vec<PluginSettings>,
}

impl AllSetting {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.setting_list
            .iter()
            .find(|setting| setting.key == key)
            .map(|setting| setting.value.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelDisplay {
    pub foreground: Option<String>,
    pub background: Option<String>,
    pub icon: Option<String>,
    pub display_name: Option<String>,
    #[serde(rename = "toolip")]
    pub tooltip: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelOnOff {
    pub on: Option<LabelDisplay>,
    pub off: Option<LabelDisplay>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelStyle {
    pub label: Option<LabelOnOff>,
    pub filter: Option<LabelOnOff>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelSetting {
    pub label: String,
    pub categories: Vec<String>,
    pub report_name: Option<String>,
    pub style: Option<LabelStyle>,
}

impl LabelSetting {
    /// Label drawn `fore_color` on `back_color` when set, colors swapped when
    /// unset.
    pub fn simple(name: &str, back_color: &str, fore_color: &str) -> Self {
        let on_off = || LabelOnOff {
            on: Some(LabelDisplay {
                foreground: Some(fore_color.to_owned()),
                background: Some(back_color.to_owned()),
                display_name: Some(name.to_owned()),
                ..LabelDisplay::default()
            }),
            off: Some(LabelDisplay {
                foreground: Some(back_color.to_owned()),
                background: Some(fore_color.to_owned()),
                display_name: Some(name.to_owned()),
                ..LabelDisplay::default()
            }),
        };
        Self {
            label: name.to_owned(),
            categories: Vec::new(),
            report_name: Some(name.to_owned()),
            style: Some(LabelStyle {
                label: Some(on_off()),
                filter: Some(on_off()),
            }),
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        self.report_name.as_deref().filter(|name| !name.is_empty())
    }

    fn rename_category(&mut self, old_short: &str, new_short: &str) -> bool {
        rename_in(&mut self.categories, old_short, new_short)
    }
}

/// Decoded `labels` project setting.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelsSetting {
    pub labels: Vec<LabelSetting>,
    pub groups: Vec<Value>,
}

impl LabelsSetting {
    pub fn category_has_label(&self, category: &str) -> bool {
        self.labels
            .iter()
            .any(|label| label.categories.iter().any(|c| c == category))
    }

    /// Display name of `label`, or the label itself.
    pub fn display_label<'a>(&'a self, label: &'a str) -> &'a str {
        self.labels
            .iter()
            .find(|setting| setting.label == label)
            .and_then(LabelSetting::display_name)
            .unwrap_or(label)
    }

    pub fn labels_for_category(&self, category: &str) -> Vec<String> {
        self.labels
            .iter()
            .filter(|label| label.categories.iter().any(|c| c == category))
            .map(|label| label.label.clone())
            .collect()
    }

    /// Returns whether anything changed.
    pub fn rename_category(&mut self, old_short: &str, new_short: &str) -> bool {
        let mut modified = false;
        for label in &mut self.labels {
            modified |= label.rename_category(old_short, new_short);
        }
        modified
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceRule {
    pub message: String,
    pub name: String,
    pub rule: String,
    pub any_of: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceRuleCategory {
    pub category: String,
    pub end_point: Option<String>,
    pub creates_end: Option<bool>,
    pub expected: i32,
    pub reporting: Vec<String>,
    pub down_rules: Vec<TraceRule>,
    pub up_rules: Vec<TraceRule>,
}

/// Decoded `rules` (traceability) project setting.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceabilitySetting {
    pub rules: Vec<TraceRuleCategory>,
}

impl TraceabilitySetting {
    pub fn up_categories(&self, category: &str) -> Vec<String> {
        self.rule(category)
            .map(|rule| flatten_any_of(&rule.up_rules))
            .unwrap_or_default()
    }

    pub fn down_categories(&self, category: &str) -> Vec<String> {
        self.rule(category)
            .map(|rule| flatten_any_of(&rule.down_rules))
            .unwrap_or_default()
    }

    /// Drops the rules of `category` and every reference to it. A rule left
    /// with no category is removed.
    pub fn remove_category(&mut self, category: &str) -> bool {
        let before = self.clone();
        self.rules.retain(|rule| rule.category != category);
        for rule in &mut self.rules {
            strip_category(&mut rule.down_rules, category);
            strip_category(&mut rule.up_rules, category);
        }
        *self != before
    }

    fn rule(&self, category: &str) -> Option<&TraceRuleCategory> {
        self.rules.iter().find(|rule| rule.category == category)
    }
}

fn flatten_any_of(rules: &[TraceRule]) -> Vec<String> {
    rules.iter().flat_map(|rule| rule.any_of.clone()).collect()
}

fn strip_category(rules: &mut Vec<TraceRule>, category: &str) {
    rules.retain(|rule| !(rule.any_of.len() == 1 && rule.any_of[0] == category));
    for rule in rules.iter_mut() {
        rule.any_of.retain(|c| c != category);
    }
}

fn rename_in(values: &mut [String], old: &str, new: &str) -> bool {
    let mut modified = false;
    for value in values.iter_mut().filter(|value| value.as_str() == old) {
        *value = new.to_owned();
        modified = true;
    }
    modified
}

/// Decoded `deleted_projects` customer setting.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeletedProjectsSetting {
    pub deleted: Vec<String>,
}
