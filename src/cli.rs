use crate::decomposition::DecompositionMethod;
use crate::{Arguments, Mode};
use clap::{
    arg, crate_authors, crate_description, crate_name, crate_version, value_parser, Arg,
    ArgMatches, Command,
};
use std::ffi::OsString;
use std::path::PathBuf;
use std::{io, thread};

pub struct CLIParser {
    command: Command,
}

impl CLIParser {
    pub fn new() -> Self {
        let command = Self::create_base_command();
        let command = Self::register_arguments(command);
        CLIParser { command }
    }

    pub fn parse<I, T>(&mut self, itr: I) -> Arguments
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self
            .command
            .try_get_matches_from_mut(itr)
            .unwrap_or_else(|e| e.exit());
        Self::extract_arguments(&matches)
    }

    fn register_arguments(command: Command) -> Command {
        let command = Self::register_input_file_argument(command);
        let command = Self::register_output_file_argument(command);
        let command = Self::register_mode_argument(command);
        let command = Self::register_method_argument(command);
        let command = Self::register_compression_factor_argument(command);
        let command = Self::register_time_budget_argument(command);
        let command = Self::register_seed_argument(command);
        Self::register_threads_argument(command)
    }

    fn register_input_file_argument(command: Command) -> Command {
        command.arg(Self::create_input_file_argument())
    }

    fn register_output_file_argument(command: Command) -> Command {
        command.arg(Self::create_output_file_argument())
    }

    fn register_mode_argument(command: Command) -> Command {
        command.arg(Self::create_mode_argument())
    }

    fn register_method_argument(command: Command) -> Command {
        command.arg(Self::create_method_argument())
    }

    fn register_compression_factor_argument(command: Command) -> Command {
        command.arg(Self::create_compression_factor_argument())
    }

    fn register_time_budget_argument(command: Command) -> Command {
        command.arg(Self::create_time_budget_argument())
    }

    fn register_seed_argument(command: Command) -> Command {
        command.arg(Self::create_seed_argument())
    }

    fn register_threads_argument(command: Command) -> Command {
        command.arg(Self::create_threads_argument())
    }

    fn create_base_command() -> Command {
        Command::new(crate_name!())
            .version(crate_version!())
            .author(crate_authors!())
            .about(crate_description!())
    }

    fn create_input_file_argument() -> Arg {
        Arg::new("input_file")
            .help("Path to the image or compressed frame to read")
            .value_parser(value_parser!(PathBuf))
            .required(true)
    }

    fn create_output_file_argument() -> Arg {
        Arg::new("output_file")
            .help("Path to the compressed frame or image to write")
            .value_parser(value_parser!(PathBuf))
            .required(true)
    }

    fn create_mode_argument() -> Arg {
        arg!(--mode <MODE> "Compress an image or decompress a frame")
            .required(true)
            .value_parser(value_parser!(Mode))
    }

    fn create_method_argument() -> Arg {
        arg!(-m --method <METHOD> "Decomposition method used for compression")
            .required(false)
            .value_parser(value_parser!(DecompositionMethod))
    }

    fn create_compression_factor_argument() -> Arg {
        arg!(compression_factor: -c --compression <FACTOR> "Target ratio of raw to stored bytes")
            .required(false)
            .value_parser(value_parser!(f64))
    }

    fn create_time_budget_argument() -> Arg {
        arg!(time_budget: -b --budget <MILLIS> "Time budget of iterative methods in milliseconds")
            .required(false)
            .value_parser(value_parser!(u64))
    }

    fn create_seed_argument() -> Arg {
        arg!(-s --seed <SEED> "Seed for the random start of iterative methods")
            .required(false)
            .value_parser(value_parser!(u64))
    }

    fn create_threads_argument() -> Arg {
        arg!(-t --threads <THREADS> "Number of Threads")
            .default_value(get_number_of_threads().unwrap_or(1).to_string())
            .required(false)
            .value_parser(value_parser!(usize))
    }

    fn extract_arguments(matches: &ArgMatches) -> Arguments {
        Arguments {
            mode: Self::extract_mode_argument(matches),
            input_file: Self::extract_input_file_argument(matches),
            output_file: Self::extract_output_file_argument(matches),
            method: Self::extract_method_argument(matches),
            compression_factor: Self::extract_compression_factor_argument(matches),
            time_budget: Self::extract_time_budget_argument(matches),
            seed: Self::extract_seed_argument(matches),
            number_of_threads: Self::extract_threads_argument(matches),
        }
    }

    fn extract_input_file_argument(matches: &ArgMatches) -> PathBuf {
        matches
            .get_one::<PathBuf>("input_file")
            .expect("Required argument input_file not provided")
            .clone()
    }

    fn extract_output_file_argument(matches: &ArgMatches) -> PathBuf {
        matches
            .get_one::<PathBuf>("output_file")
            .expect("Required argument output_file not provided")
            .clone()
    }

    fn extract_mode_argument(matches: &ArgMatches) -> Mode {
        matches
            .get_one::<Mode>("mode")
            .expect("Required argument mode not provided")
            .to_owned()
    }

    fn extract_method_argument(matches: &ArgMatches) -> Option<DecompositionMethod> {
        matches.get_one::<DecompositionMethod>("method").copied()
    }

    fn extract_compression_factor_argument(matches: &ArgMatches) -> Option<f64> {
        matches.get_one::<f64>("compression_factor").copied()
    }

    fn extract_time_budget_argument(matches: &ArgMatches) -> Option<u64> {
        matches.get_one::<u64>("time_budget").copied()
    }

    fn extract_seed_argument(matches: &ArgMatches) -> Option<u64> {
        matches.get_one::<u64>("seed").copied()
    }

    fn extract_threads_argument(matches: &ArgMatches) -> usize {
        matches
            .get_one::<usize>("threads")
            .expect("Required argument threads not provided")
            .to_owned()
    }
}

impl Default for CLIParser {
    fn default() -> Self {
        Self::new()
    }
}

fn get_number_of_threads() -> io::Result<usize> {
    Ok(thread::available_parallelism()?.get())
}

#[cfg(test)]
mod tests {
    use clap::{error::ErrorKind, Command};

    use super::{CLIParser, DecompositionMethod, Mode};

    const PROGRAM_NAME_ARGUMENT: &str = "test_program_name";

    #[test]
    fn parse_input_file_argument() {
        let input_file_name = "testfile.ppm";
        let command = Command::new("test");
        let command = CLIParser::register_input_file_argument(command);
        let matches = command.get_matches_from(vec![PROGRAM_NAME_ARGUMENT, input_file_name]);
        let input_file = CLIParser::extract_input_file_argument(&matches);
        assert_eq!(input_file.file_name().unwrap(), input_file_name);
    }

    #[test]
    fn parse_output_file_argument() {
        let output_file_name = "testfile.svds";
        let command = Command::new("test");
        let command = CLIParser::register_output_file_argument(command);
        let matches = command.get_matches_from(vec![PROGRAM_NAME_ARGUMENT, output_file_name]);
        let output_file = CLIParser::extract_output_file_argument(&matches);
        assert_eq!(output_file.file_name().unwrap(), output_file_name);
    }

    #[test]
    fn parse_mode_argument() {
        let command = Command::new("test");
        let command = CLIParser::register_mode_argument(command);
        let matches = command.get_matches_from(vec![PROGRAM_NAME_ARGUMENT, "--mode", "decompress"]);
        let mode = CLIParser::extract_mode_argument(&matches);
        assert_eq!(mode, Mode::Decompress);
    }

    #[test]
    fn parse_missing_mode_argument() {
        let command = Command::new("test");
        let command = CLIParser::register_mode_argument(command);
        let result = command.try_get_matches_from(vec![PROGRAM_NAME_ARGUMENT]);
        if let Err(error) = result {
            assert_eq!(error.kind(), ErrorKind::MissingRequiredArgument);
        } else {
            panic!("Missing mode not detected");
        }
    }

    #[test]
    fn parse_method_argument() {
        let command = Command::new("test");
        let command = CLIParser::register_method_argument(command);
        let matches = command.get_matches_from(vec![
            PROGRAM_NAME_ARGUMENT,
            "--method",
            "block-power-iteration",
        ]);
        let method = CLIParser::extract_method_argument(&matches);
        assert_eq!(method, Some(DecompositionMethod::BlockPowerIteration));
    }

    #[test]
    fn parse_method_alias() {
        for (alias, expected) in [
            ("numpy", DecompositionMethod::Direct),
            ("simple", DecompositionMethod::PowerIteration),
            ("advanced", DecompositionMethod::BlockPowerIteration),
        ] {
            let command = Command::new("test");
            let command = CLIParser::register_method_argument(command);
            let matches = command.get_matches_from(vec![PROGRAM_NAME_ARGUMENT, "-m", alias]);
            let method = CLIParser::extract_method_argument(&matches);
            assert_eq!(method, Some(expected), "alias {} does not match", alias);
        }
    }

    #[test]
    fn parse_illegal_method_argument() {
        let command = Command::new("test");
        let command = CLIParser::register_method_argument(command);
        let result = command.try_get_matches_from(vec![PROGRAM_NAME_ARGUMENT, "-m", "lanczos"]);
        if let Err(error) = result {
            assert_eq!(error.kind(), ErrorKind::InvalidValue);
        } else {
            panic!("Illegal value for method not detected");
        }
    }

    #[test]
    fn parse_absent_method_argument() {
        let command = Command::new("test");
        let command = CLIParser::register_method_argument(command);
        let matches = command.get_matches_from(vec![PROGRAM_NAME_ARGUMENT]);
        assert_eq!(CLIParser::extract_method_argument(&matches), None);
    }

    #[test]
    fn parse_compression_factor_argument() {
        let command = Command::new("test");
        let command = CLIParser::register_compression_factor_argument(command);
        let matches =
            command.get_matches_from(vec![PROGRAM_NAME_ARGUMENT, "--compression", "2.5"]);
        let factor = CLIParser::extract_compression_factor_argument(&matches);
        assert_eq!(factor, Some(2.5));
    }

    #[test]
    fn parse_illegal_compression_factor_argument() {
        let command = Command::new("test");
        let command = CLIParser::register_compression_factor_argument(command);
        let result = command.try_get_matches_from(vec![PROGRAM_NAME_ARGUMENT, "-c", "half"]);
        if let Err(error) = result {
            assert_eq!(error.kind(), ErrorKind::ValueValidation);
        } else {
            panic!("Illegal value for compression factor not detected");
        }
    }

    #[test]
    fn parse_time_budget_argument() {
        let command = Command::new("test");
        let command = CLIParser::register_time_budget_argument(command);
        let matches = command.get_matches_from(vec![PROGRAM_NAME_ARGUMENT, "-b", "1500"]);
        let budget = CLIParser::extract_time_budget_argument(&matches);
        assert_eq!(budget, Some(1500));
    }

    #[test]
    fn parse_seed_argument() {
        let command = Command::new("test");
        let command = CLIParser::register_seed_argument(command);
        let matches = command.get_matches_from(vec![PROGRAM_NAME_ARGUMENT, "--seed", "42"]);
        let seed = CLIParser::extract_seed_argument(&matches);
        assert_eq!(seed, Some(42));
    }

    #[test]
    fn parse_number_of_threads_argument() {
        let command = Command::new("test");
        let command = CLIParser::register_threads_argument(command);
        let matches = command.get_matches_from(vec![PROGRAM_NAME_ARGUMENT, "--threads", "5"]);
        let actual = CLIParser::extract_threads_argument(&matches);
        let expected = 5;
        assert_eq!(actual, expected);
    }

    #[test]
    fn parse_required_arguments_only() {
        let input_file_name = "inputfile.svds";
        let input_file_path = format!("/input_directory/{}", input_file_name);
        let output_file_name = "outputfile.png";
        let output_file_path = format!("/output_directory/{}", output_file_name);
        let mut cli_parser = CLIParser::default();
        let arguments = cli_parser.parse(vec![
            PROGRAM_NAME_ARGUMENT,
            &input_file_path,
            &output_file_path,
            "--mode",
            "decompress",
            "-t",
            "8",
        ]);
        assert_eq!(
            arguments.input_file.file_name().unwrap(),
            input_file_name,
            "input file does not match"
        );
        assert_eq!(
            arguments.output_file.file_name().unwrap(),
            output_file_name,
            "output file does not match"
        );
        assert_eq!(arguments.mode, Mode::Decompress, "mode does not match");
        assert_eq!(arguments.method, None, "method does not match");
        assert_eq!(
            arguments.compression_factor, None,
            "compression factor does not match"
        );
        assert_eq!(arguments.time_budget, None, "time budget does not match");
        assert_eq!(
            arguments.number_of_threads, 8,
            "number_of_threads does not match"
        );
    }

    #[test]
    fn parse_all_compression_arguments() {
        let mut cli_parser = CLIParser::default();
        let arguments = cli_parser.parse(vec![
            PROGRAM_NAME_ARGUMENT,
            "image.ppm",
            "image.svds",
            "--mode",
            "compress",
            "--method",
            "power-iteration",
            "--compression",
            "4",
            "--budget",
            "200",
            "--seed",
            "9",
        ]);
        assert_eq!(arguments.mode, Mode::Compress);
        assert_eq!(arguments.method, Some(DecompositionMethod::PowerIteration));
        assert_eq!(arguments.compression_factor, Some(4.0));
        assert_eq!(arguments.time_budget, Some(200));
        assert_eq!(arguments.seed, Some(9));
    }
}
