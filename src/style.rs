//! Terminal styling for command output
//!
//! One palette for every command: green means the switch went through, yellow
//! marks a degraded result (fallback sink, streams left behind), red is failure.

use crossterm::style::Stylize;

use crate::classify::Category;

/// Palette methods on anything crossterm can style
///
/// ```
/// use audio_toggle::style::ToggleStyle;
///
/// println!("{} {}", "Switched to:".success(), "WH-1000XM4");
/// println!("{}", "No headset/headphone device found".warning());
/// ```
pub trait ToggleStyle: Stylize {
    /// Section titles in `status` and `list-sinks`
    fn header(self) -> <<Self as Stylize>::Styled as Stylize>::Styled
    where
        Self: Sized,
        <Self as Stylize>::Styled: Stylize,
    {
        self.cyan().bold()
    }

    fn success(self) -> <Self as Stylize>::Styled
    where
        Self: Sized,
    {
        self.green()
    }

    fn error(self) -> <Self as Stylize>::Styled
    where
        Self: Sized,
    {
        self.red()
    }

    /// Fallback selections and partial stream moves
    fn warning(self) -> <Self as Stylize>::Styled
    where
        Self: Sized,
    {
        self.yellow()
    }

    /// Sink names, keywords, paths
    fn technical(self) -> <Self as Stylize>::Styled
    where
        Self: Sized,
    {
        self.cyan()
    }
}

impl<T: Stylize> ToggleStyle for T {}

/// Category name colored by kind: headset green, speaker cyan, unknown yellow
#[must_use]
pub fn category(category: Category) -> String {
    let name = category.as_str();
    match category {
        Category::Headset => name.success().to_string(),
        Category::Speaker => name.technical().to_string(),
        Category::Unknown => name.warning().to_string(),
    }
}
