//! Help output colors.

use clap::builder::Styles;
use clap::builder::styling::AnsiColor;

/// Yellow headers, blue literals, dimmed placeholders.
pub fn cli_styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Yellow.on_default().bold())
		.usage(AnsiColor::Yellow.on_default().bold())
		.literal(AnsiColor::Blue.on_default().bold())
		.placeholder(AnsiColor::BrightBlack.on_default())
		.valid(AnsiColor::Blue.on_default())
		.invalid(AnsiColor::Red.on_default().bold())
		.error(AnsiColor::Red.on_default().bold())
}
