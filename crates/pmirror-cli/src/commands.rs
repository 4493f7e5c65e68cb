use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use pmirror_catalog::{DirectorySnapshot, GitSource, SourceSnapshot, VersionCatalog};
use pmirror_release::{
    CommandGenerator, MirrorConfig, MirrorRepository, ReleaseSynthesizer, SynthesisReport,
    UnstableTrackManager,
};
use serde_json::json;
use tracing::{info, warn};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    let config = MirrorConfig::discover(cli.config.as_deref(), &cwd)?;
    match cli.command {
        Command::Init(args) => cmd_init(args, &cli.format),
        Command::Catalog(args) => cmd_catalog(args, &config, &cli.format),
        Command::Sync(args) => cmd_sync(args, &config, &cli.format),
        Command::Releases(args) => cmd_releases(args, &cli.format),
    }
}

/// Catalogs read from the upstream.
struct Upstream {
    label: String,
    stable: Box<dyn SourceSnapshot>,
    /// Snapshot at `upstream_branch`; absent for plain directories.
    unstable: Option<Box<dyn SourceSnapshot>>,
}

fn open_upstream(args: &UpstreamArgs, config: &MirrorConfig) -> anyhow::Result<Upstream> {
    if args.plain {
        let snapshot = DirectorySnapshot::open(&args.upstream).with_context(|| {
            format!("cannot open upstream directory {}", args.upstream.display())
        })?;
        return Ok(Upstream {
            label: snapshot.describe(),
            stable: Box::new(snapshot),
            unstable: None,
        });
    }

    let source = GitSource::open(&args.upstream)
        .with_context(|| format!("cannot open upstream {}", args.upstream.display()))?;
    let (label, commit) = match &args.rev {
        Some(rev) => {
            let commit = source
                .resolve_commit(rev)
                .with_context(|| format!("cannot resolve upstream revision {rev}"))?;
            (rev.clone(), commit)
        }
        None => {
            let point = source
                .latest_stable()
                .context("cannot determine the latest stable upstream release")?;
            info!(tag = %point.tag, commit = %point.commit, "latest stable upstream release");
            (point.tag, point.commit)
        }
    };
    let unstable_commit = source
        .resolve_commit(&config.upstream_branch)
        .with_context(|| format!("cannot resolve upstream {}", config.upstream_branch))?;
    info!(rev = %config.upstream_branch, commit = %unstable_commit, "latest unstable upstream commit");

    Ok(Upstream {
        label,
        stable: Box::new(source.snapshot(&commit)),
        unstable: Some(Box::new(source.snapshot(&unstable_commit))),
    })
}

fn proto_dir<'a>(args: &'a UpstreamArgs, config: &'a MirrorConfig) -> &'a str {
    args.proto_dir.as_deref().unwrap_or(&config.proto_dir)
}

fn discover(snapshot: &dyn SourceSnapshot, dir: &str) -> anyhow::Result<VersionCatalog> {
    VersionCatalog::discover(snapshot, dir)
        .with_context(|| format!("cannot read protocol definitions from {}", snapshot.describe()))
}

fn cmd_init(args: InitArgs, format: &OutputFormat) -> anyhow::Result<()> {
    MirrorRepository::init(&args.target)
        .with_context(|| format!("cannot initialize {}", args.target.display()))?;
    match format {
        OutputFormat::Json => println!("{}", json!({ "initialized": args.target })),
        OutputFormat::Text => println!(
            "{} Initialized release repository in {}",
            "✓".green().bold(),
            args.target.display().to_string().bold()
        ),
    }
    Ok(())
}

fn cmd_catalog(args: CatalogArgs, config: &MirrorConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let upstream = open_upstream(&args.upstream, config)?;
    let catalog = discover(upstream.stable.as_ref(), proto_dir(&args.upstream, config))?;

    match format {
        OutputFormat::Json => {
            let versions: Vec<_> = catalog
                .iter()
                .map(|(v, c)| json!({ "version": v, "tag": v.tag_name(), "content": c }))
                .collect();
            println!("{}", json!({ "upstream": upstream.label, "versions": versions }));
        }
        OutputFormat::Text => {
            println!("Protocol versions at {}:", upstream.label.yellow());
            if catalog.is_empty() {
                println!("  (none)");
            }
            for (version, content) in catalog.iter() {
                println!("  {}  {}", version.tag_name().green(), content.short().dimmed());
            }
        }
    }
    Ok(())
}

fn cmd_sync(args: SyncArgs, config: &MirrorConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let upstream = open_upstream(&args.upstream, config)?;
    let dir = proto_dir(&args.upstream, config);
    let catalog = discover(upstream.stable.as_ref(), dir)?;
    let unstable_catalog = match &upstream.unstable {
        Some(unstable) => Some(discover(unstable.as_ref(), dir)?),
        None => None,
    };
    let repo = open_target(&args.target)?;
    let ledger = repo.ledger();

    if args.dry_run {
        let pending = ledger.pending(&catalog).context("cannot read release tags")?;
        match format {
            OutputFormat::Json => {
                let tags: Vec<_> = pending.iter().map(|v| v.tag_name()).collect();
                println!("{}", json!({ "dry_run": true, "would_release": tags }));
            }
            OutputFormat::Text => {
                if pending.is_empty() {
                    println!("{} Everything is released.", "✓".green());
                }
                for version in &pending {
                    println!("  {} {}", "would release".cyan(), version.tag_name().bold());
                }
            }
        }
        return Ok(());
    }

    let generator = CommandGenerator::from_config(&config.generator);
    let stop = install_stop_signal();
    let report = ReleaseSynthesizer::new(&repo, upstream.stable.as_ref(), &generator, config)
        .with_stop_signal(stop)
        .synthesize(&catalog, &ledger)?;

    if let Some(unstable_catalog) = &unstable_catalog {
        UnstableTrackManager::new().synthesize_unstable(unstable_catalog, &ledger);
    }

    print_report(&report, format);
    if !report.is_success() {
        bail!("{} version(s) failed to release", report.failed.len());
    }
    Ok(())
}

fn cmd_releases(args: ReleasesArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let repo = open_target(&args.target)?;
    let releases = repo.releases().context("cannot list releases")?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&releases)?),
        OutputFormat::Text => {
            if releases.is_empty() {
                println!("No releases.");
            }
            for release in &releases {
                println!(
                    "{}  {}  {}",
                    release.tag.yellow().bold(),
                    release.commit.short_hex().dimmed(),
                    release.message
                );
            }
        }
    }
    Ok(())
}

fn open_target(path: &Path) -> anyhow::Result<MirrorRepository> {
    MirrorRepository::open(path).with_context(|| format!("cannot open target {}", path.display()))
}

fn print_report(report: &SynthesisReport, format: &OutputFormat) {
    match format {
        OutputFormat::Json => {
            let failed: Vec<_> = report
                .failed
                .iter()
                .map(|f| {
                    json!({
                        "version": f.version,
                        "category": f.error.category(),
                        "error": f.error.to_string(),
                    })
                })
                .collect();
            println!(
                "{}",
                json!({
                    "created": report.created,
                    "skipped": report.skipped,
                    "failed": failed,
                    "stopped": report.stopped,
                })
            );
        }
        OutputFormat::Text => {
            for release in &report.created {
                println!(
                    "{} {} ({})",
                    "created".green().bold(),
                    release.tag.bold(),
                    release.module_path
                );
            }
            for version in &report.skipped {
                println!("{} {}", "skipped".dimmed(), version.tag_name());
            }
            for failure in &report.failed {
                println!(
                    "{} {}: {}",
                    "failed".red().bold(),
                    failure.version.tag_name(),
                    failure.error
                );
            }
            if report.stopped {
                println!("{}", "Stopped before all versions were processed.".yellow());
            }
            println!(
                "{} created, {} skipped, {} failed",
                report.created.len(),
                report.skipped.len(),
                report.failed.len()
            );
        }
    }
}

/// First Ctrl-C lets the current version finish; a second one exits.
fn install_stop_signal() -> Arc<AtomicBool> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(rt) => rt,
            Err(err) => {
                warn!(error = %err, "cannot install interrupt handler");
                return;
            }
        };
        runtime.block_on(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if flag.swap(true, Ordering::SeqCst) {
                    std::process::exit(130);
                }
                warn!("interrupt received; finishing the current version");
            }
        });
    });
    stop
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use pmirror_release::{CommandStep, StepDir};

    fn upstream_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let protos = dir.path().join("docs/plugin-protocol");
        std::fs::create_dir_all(&protos).unwrap();
        std::fs::write(protos.join("tfplugin5.proto"), "syntax = \"proto3\";").unwrap();
        std::fs::write(protos.join("README.md"), "notes").unwrap();
        dir
    }

    fn plain(path: &Path) -> UpstreamArgs {
        UpstreamArgs {
            upstream: path.to_path_buf(),
            rev: None,
            plain: true,
            proto_dir: None,
        }
    }

    #[test]
    fn plain_upstream_catalog() {
        let dir = upstream_dir();
        let config = MirrorConfig::default();
        let upstream = open_upstream(&plain(dir.path()), &config).unwrap();
        assert!(upstream.unstable.is_none());
        let catalog = discover(upstream.stable.as_ref(), &config.proto_dir).unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn proto_dir_flag_overrides_config() {
        let config = MirrorConfig::default();
        let mut args = plain(Path::new("."));
        assert_eq!(proto_dir(&args, &config), "docs/plugin-protocol");
        args.proto_dir = Some("protos".into());
        assert_eq!(proto_dir(&args, &config), "protos");
    }

    #[test]
    fn target_must_be_initialized() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_target(dir.path()).unwrap_err();
        assert!(err.to_string().contains("cannot open target"));
    }

    #[test]
    fn dry_run_writes_nothing() {
        let upstream = upstream_dir();
        let target = tempfile::tempdir().unwrap();
        cmd_init(InitArgs { target: target.path().to_path_buf() }, &OutputFormat::Text).unwrap();

        let args = SyncArgs {
            upstream: plain(upstream.path()),
            target: target.path().to_path_buf(),
            dry_run: true,
        };
        cmd_sync(args, &MirrorConfig::default(), &OutputFormat::Json).unwrap();
        assert!(MirrorRepository::open(target.path()).unwrap().releases().unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn sync_publishes_with_configured_steps() {
        let upstream = upstream_dir();
        let target = tempfile::tempdir().unwrap();
        let target_path: PathBuf = target.path().to_path_buf();
        cmd_init(InitArgs { target: target_path.clone() }, &OutputFormat::Text).unwrap();

        let mut config = MirrorConfig::default();
        config.generator.steps = vec![CommandStep::new(
            "sh",
            ["-c", "echo 'module {module_path}' > go.mod"],
            StepDir::Root,
        )];
        let sync = |dry_run| SyncArgs {
            upstream: plain(upstream.path()),
            target: target_path.clone(),
            dry_run,
        };

        cmd_sync(sync(false), &config, &OutputFormat::Text).unwrap();
        cmd_sync(sync(false), &config, &OutputFormat::Text).unwrap();

        let releases = MirrorRepository::open(&target_path).unwrap().releases().unwrap();
        assert_eq!(releases.len(), 1);
        assert_eq!(releases[0].tag, "v5.0.0");
        assert_eq!(releases[0].message, "Auto-generated module for protocol v5.0");
    }

    #[cfg(unix)]
    #[test]
    fn failed_versions_make_sync_fail() {
        let upstream = upstream_dir();
        let target = tempfile::tempdir().unwrap();
        cmd_init(InitArgs { target: target.path().to_path_buf() }, &OutputFormat::Text).unwrap();

        let mut config = MirrorConfig::default();
        config.generator.steps = vec![CommandStep::new("sh", ["-c", "exit 1"], StepDir::Root)];
        let args = SyncArgs {
            upstream: plain(upstream.path()),
            target: target.path().to_path_buf(),
            dry_run: false,
        };
        let err = cmd_sync(args, &config, &OutputFormat::Json).unwrap_err();
        assert!(err.to_string().contains("1 version(s) failed"));
    }

    fn git_available() -> bool {
        std::process::Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn git(dir: &Path, args: &[&str]) {
        let status = std::process::Command::new("git")
            .arg("-C")
            .arg(dir)
            .args([
                "-c",
                "user.name=Test",
                "-c",
                "user.email=test@example.com",
                "-c",
                "commit.gpgsign=false",
                "-c",
                "tag.gpgsign=false",
            ])
            .args(args)
            .status()
            .unwrap();
        assert!(status.success(), "git {args:?} failed");
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_unstable_branch_aborts_before_publishing() {
        if !git_available() {
            return;
        }
        let upstream = tempfile::tempdir().unwrap();
        let repo = upstream.path();
        git(repo, &["init", "-q"]);
        std::fs::create_dir_all(repo.join("docs/plugin-protocol")).unwrap();
        std::fs::write(repo.join("docs/plugin-protocol/tfplugin5.proto"), "five").unwrap();
        git(repo, &["add", "."]);
        git(repo, &["commit", "-q", "-m", "protocol 5"]);
        git(repo, &["tag", "-a", "v1.0.0", "-m", "release"]);
        git(repo, &["mv", "docs/plugin-protocol", "docs/protocol"]);
        git(repo, &["commit", "-q", "-m", "move protocol docs"]);

        let target = tempfile::tempdir().unwrap();
        cmd_init(InitArgs { target: target.path().to_path_buf() }, &OutputFormat::Text).unwrap();

        let mut config = MirrorConfig::default();
        config.generator.steps = vec![CommandStep::new(
            "sh",
            ["-c", "echo 'module {module_path}' > go.mod"],
            StepDir::Root,
        )];
        let args = SyncArgs {
            upstream: UpstreamArgs {
                upstream: repo.to_path_buf(),
                rev: None,
                plain: false,
                proto_dir: None,
            },
            target: target.path().to_path_buf(),
            dry_run: false,
        };

        let err = cmd_sync(args, &config, &OutputFormat::Text).unwrap_err();
        assert!(err.to_string().contains("cannot read protocol definitions"));
        assert!(MirrorRepository::open(target.path()).unwrap().releases().unwrap().is_empty());
    }
}
