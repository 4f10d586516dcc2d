//! txtbook - plain-text novel to EPUB converter

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use txtbook::util::encoding_for_label;
use txtbook::{
    BatchOptions, ConvertOptions, Converter, Error, convert_directory, read_txt_with_encoding,
};

#[derive(Parser)]
#[command(name = "txtbook")]
#[command(version, about = "Plain-text novel to EPUB converter", long_about = None)]
#[command(after_help = "EXAMPLES:
    txtbook novel.txt                    Convert novel.txt to novel.epub
    txtbook novel.txt -o out.epub        Choose the output path
    txtbook --encoding gbk novel.txt     Read a GBK-encoded file
    txtbook -i novel.txt                 Show the detected volumes and chapters
    txtbook ./books                      Convert every .txt file in a directory
    txtbook --encoding gbk ./books       Batch convert GBK-encoded files
    txtbook                              Convert every .txt file in the current directory")]
struct Cli {
    /// Input text file, or a directory to batch convert (default: current directory)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Output EPUB file (single file only; default: INPUT with .epub extension)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Book title (single file only; default: input file stem)
    #[arg(long)]
    title: Option<String>,

    /// Book author
    #[arg(long)]
    author: Option<String>,

    /// Cover image (single file only; default: INPUT stem with .jpg, .jpeg or .png if present)
    #[arg(long, value_name = "IMAGE")]
    cover: Option<PathBuf>,

    /// Source text encoding label, e.g. utf-8, gbk, gb18030, big5
    #[arg(long, value_name = "LABEL")]
    encoding: Option<String>,

    /// Language tag written into the EPUB metadata
    #[arg(long, value_name = "TAG")]
    language: Option<String>,

    /// Show the detected structure without converting
    #[arg(short, long)]
    info: bool,

    /// With --info, print the structure as JSON
    #[arg(long, requires = "info")]
    json: bool,

    /// Suppress output messages
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Warn
        } else {
            log::LevelFilter::Info
        })
        .parse_default_env()
        .init();

    let input = cli.input.clone().unwrap_or_else(|| PathBuf::from("."));

    let result = if cli.info {
        show_info(&cli, &input)
    } else if input.is_dir() {
        convert_all(&cli, &input)
    } else {
        convert(&cli, &input)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn show_info(cli: &Cli, path: &Path) -> Result<(), Error> {
    if path.is_dir() {
        return Err(Error::InvalidInput(format!(
            "--info needs a text file, but {} is a directory",
            path.display()
        )));
    }

    let encoding = cli.encoding.as_deref().map(encoding_for_label).transpose()?;
    let volumes = read_txt_with_encoding(path, encoding)?;

    if cli.json {
        let json = serde_json::to_string_pretty(&volumes)
            .map_err(|e| Error::InvalidInput(e.to_string()))?;
        println!("{json}");
        return Ok(());
    }

    println!("File: {}", path.display());
    println!("Volumes: {}", volumes.len());
    println!(
        "Chapters: {}",
        volumes.iter().map(|v| v.chapters.len()).sum::<usize>()
    );
    for volume in &volumes {
        println!("{}", volume.title);
        for chapter in &volume.chapters {
            println!("  {} ({} lines)", chapter.title, chapter.content.len());
        }
    }

    Ok(())
}

fn convert(cli: &Cli, input: &Path) -> Result<(), Error> {
    let mut options = ConvertOptions::for_input(input);
    if let Some(ref output) = cli.output {
        options = options.with_output(output);
    }
    if let Some(ref title) = cli.title {
        options = options.with_title(title);
    }
    if let Some(ref author) = cli.author {
        options = options.with_author(author);
    }
    if let Some(ref cover) = cli.cover {
        options = options.with_cover(cover);
    }
    if let Some(ref language) = cli.language {
        options = options.with_language(language);
    }
    if let Some(ref label) = cli.encoding {
        options = options.with_encoding(encoding_for_label(label)?);
    }

    let summary = Converter::new(options)
        .with_progress(|p| log::debug!("progress: {p}%"))
        .run()?;

    if !cli.quiet {
        println!(
            "{} -> {} ({} volumes, {} chapters)",
            summary.input.display(),
            summary.output.display(),
            summary.volumes,
            summary.chapters
        );
    }
    Ok(())
}

fn convert_all(cli: &Cli, dir: &Path) -> Result<(), Error> {
    if cli.output.is_some() || cli.title.is_some() || cli.cover.is_some() {
        return Err(Error::InvalidInput(
            "--output, --title and --cover apply to a single file, not a directory".to_string(),
        ));
    }

    let mut batch = BatchOptions::new();
    if let Some(ref author) = cli.author {
        batch = batch.with_author(author);
    }
    if let Some(ref language) = cli.language {
        batch = batch.with_language(language);
    }
    if let Some(ref label) = cli.encoding {
        batch = batch.with_encoding(encoding_for_label(label)?);
    }

    let report = convert_directory(dir, &batch)?;

    if !cli.quiet {
        for summary in &report.converted {
            println!(
                "{} -> {} ({} chapters)",
                summary.input.display(),
                summary.output.display(),
                summary.chapters
            );
        }
    }
    for (path, e) in &report.failed {
        eprintln!("failed: {}: {e}", path.display());
    }

    if report.failed.is_empty() {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "{} of {} file(s) failed to convert",
            report.failed.len(),
            report.failed.len() + report.converted.len()
        )))
    }
}
