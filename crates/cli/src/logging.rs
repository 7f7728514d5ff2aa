use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

pub fn init_logging(verbosity: u8) {
	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

	let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(stderr)
		.with_target(true)
		.with_level(true)
		.compact()
		.init();
}

/// Directive used when `RUST_LOG` is unset.
///
/// 0 keeps absorbed-failure warnings from the stagectl crates visible and
/// silences everything else below error; `-v` is info, `-vv` debug.
pub fn default_filter(verbosity: u8) -> &'static str {
	match verbosity {
		0 => "error,stagectl=warn,stagectl_runtime=warn,stagectl_cli=warn",
		1 => "info,tokio_tungstenite=warn,tungstenite=warn",
		_ => "debug",
	}
}
