/*
[INPUT]:  Values with their change classification
[OUTPUT]: Terminal text with transient highlight styling
[POS]:    Presentation helpers - shared by page views and the console
[UPDATE]: When changing how highlights look in the terminal
*/

use std::fmt::Display;

use console::style;
use valar_refresh::ChangeType;

/// Styled value while `class` is set; plain text at rest.
pub fn highlighted(value: impl Display, change: ChangeType, class: Option<&str>) -> String {
    if class.is_none() {
        return value.to_string();
    }
    match change {
        ChangeType::Increase => style(format!("{value} ▲")).green().bold().to_string(),
        ChangeType::Decrease => style(format!("{value} ▼")).red().bold().to_string(),
        ChangeType::None => value.to_string(),
    }
}

pub fn heading(text: &str) -> String {
    style(text).bold().cyan().to_string()
}

pub fn dim(text: impl Display) -> String {
    style(text).dim().to_string()
}
