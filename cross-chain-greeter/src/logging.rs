use tracing_subscriber::EnvFilter;

const DOT: &str = "🔵";

/// Rows in the banner letter
const BANNER_ROWS: usize = 25;

/// Row holding the letter's crossbar
const BANNER_CROSSBAR: usize = 12;

/// Width, in UTF-16 units, rows are centred to
const BANNER_WIDTH: usize = 60;

/// Set up the global tracing subscriber
///
/// `RUST_LOG` is honoured; our own crate logs at info by default and the HTTP
/// stack is kept quiet.
pub fn init() -> eyre::Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("cross_chain_greeter=info".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?)
        .add_directive("alloy_transport_http=warn".parse()?);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| eyre::eyre!(e))
}

/// Lines of the opening banner: a big "A" drawn with blue dots
pub fn banner_lines(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = (0..BANNER_ROWS)
        .map(|row| {
            let inner = if row == BANNER_CROSSBAR {
                DOT.repeat(row)
            } else {
                " ".repeat(row * 2)
            };
            let mut line = format!("{DOT}{inner}{DOT}");
            while line.encode_utf16().count() < BANNER_WIDTH {
                line = format!(" {line} ");
            }
            line
        })
        .collect();

    lines.push(format!("Arbitrum Demo: {text}"));
    lines.extend(["Lets", "Go ➡️", "...🚀", ""].map(String::from));
    lines
}

/// Print the opening banner
pub fn banner(text: &str) {
    for line in banner_lines(text) {
        println!("{line}");
    }
}

/// Print a section title between two rows of '#'
pub fn title(text: &str) {
    println!("\n###################");
    println!("{text}");
    println!("###################");
}
