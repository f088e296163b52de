use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};

const CONFIG_FILE_PATH: &str = "log4rs.yaml";
const FALLBACK_PATTERN: &str = "{d(%H:%M:%S%.3f)} {l} {t} - {m}{n}";

#[ctor::ctor]
fn init() {
    if log4rs::init_file(CONFIG_FILE_PATH, Default::default()).is_err() {
        init_fallback();
    }
}

fn init_fallback() {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(FALLBACK_PATTERN)))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(LevelFilter::Warn));
    if let Ok(config) = config {
        // a logger may already be installed by the embedding application
        let _ = log4rs::init_config(config);
    }
}

pub fn log_frame_header(magic: &[u8], header: &[u8]) {
    fn get_byte_array(bytes: &[u8]) -> Vec<String> {
        bytes.iter().map(|byte| format!("{:02X}", byte)).collect()
    }
    log::debug!(
        "{:?} {:?}",
        get_byte_array(magic),
        get_byte_array(header)
    );
}
