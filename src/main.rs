use anyhow::{anyhow, Result};
use std::path::PathBuf;

use facecat::catalog::{CatalogCache, CatalogClient, HttpCatalog, IdentityId, MediaId};
use facecat::config::Config;
use facecat::dedup;
use facecat::identity::{duplicates, grouping, merge, primary};
use facecat::logging;

struct CliArgs {
    config_path: Option<PathBuf>,
    command: Vec<String>,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path = None;
    let mut command = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("facecat {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                } else {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
            }
            _ => {
                command = args[i..].to_vec();
                break;
            }
        }
        i += 1;
    }

    CliArgs {
        config_path,
        command,
    }
}

fn print_help() {
    println!("facecat - face identity catalog maintenance");
    println!();
    println!("Usage: facecat [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("Options:");
    println!("  -c, --config <PATH>   Use an alternate config file");
    println!("  -h, --help            Show this help");
    println!("  -V, --version         Show version");
    println!();
    println!("Commands:");
    println!("  list                               List catalog identities");
    println!("  duplicates <identity-id>           Near-duplicate embeddings of one identity");
    println!("  groups [<threshold>]               Candidate merge groups across the catalog");
    println!("  merge <id> <id>... [--into <id>]   Merge identities into one survivor");
    println!("  set-primary <identity-id>          Re-elect the identity's primary embedding");
    println!("  dedup-tag <media-id> <media-id>... Tag media items as one duplicate group");
}

fn parse_id(raw: &str) -> Result<i64> {
    raw.parse::<i64>()
        .map_err(|_| anyhow!("'{}' is not a numeric id", raw))
}

fn main() -> Result<()> {
    logging::init(None)?;

    let args = parse_args();
    if args.command.is_empty() {
        print_help();
        std::process::exit(1);
    }

    let config = match args.config_path {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let client = HttpCatalog::from_config(&config.backend);
    let mut cache = CatalogCache::new();

    let command = args.command[0].as_str();
    let rest = &args.command[1..];

    match command {
        "list" => cmd_list(&client, &mut cache),
        "duplicates" => cmd_duplicates(&client, &config, rest),
        "groups" => cmd_groups(&client, &config, rest),
        "merge" => cmd_merge(&client, &mut cache, rest),
        "set-primary" => cmd_set_primary(&client, rest),
        "dedup-tag" => cmd_dedup_tag(&client, &mut cache, &config, rest),
        other => {
            eprintln!("Unknown command: {}", other);
            print_help();
            std::process::exit(1);
        }
    }
}

fn cmd_list(client: &HttpCatalog, cache: &mut CatalogCache) -> Result<()> {
    let identities = client.list_catalog()?;
    cache.store(identities.clone());

    println!(
        "{:>8}  {:>10}  {:>6}  NAME",
        "ID", "EMBEDDINGS", "MEDIA"
    );
    for identity in &identities {
        println!(
            "{:>8}  {:>10}  {:>6}  {}",
            identity.id, identity.embedding_count, identity.linked_media_count, identity.name
        );
    }
    println!("{} identities", identities.len());
    Ok(())
}

fn cmd_duplicates(client: &HttpCatalog, config: &Config, rest: &[String]) -> Result<()> {
    let id = rest
        .first()
        .ok_or_else(|| anyhow!("duplicates requires an identity id"))?;
    let identity = client.get_identity(IdentityId(parse_id(id)?))?;

    let clusters = duplicates::find_duplicate_embeddings(
        &identity.embeddings,
        config.clustering.confidence_eps,
        config.clustering.quality_eps,
    );

    if clusters.is_empty() {
        println!("No duplicate embeddings in '{}'", identity.name);
        return Ok(());
    }
    for cluster in &clusters {
        println!(
            "original {} -> {} duplicate(s): {}",
            cluster.original,
            cluster.duplicates.len(),
            cluster
                .duplicates
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    Ok(())
}

fn cmd_groups(client: &HttpCatalog, config: &Config, rest: &[String]) -> Result<()> {
    let threshold = match rest.first() {
        Some(raw) => raw
            .parse::<f32>()
            .map_err(|_| anyhow!("'{}' is not a threshold", raw))?,
        None => config.clustering.group_threshold,
    };

    let groups = grouping::group_by_similarity(client, threshold)?;
    if groups.is_empty() {
        println!("No similarity groups at threshold {}", threshold);
        return Ok(());
    }
    for group in &groups {
        println!("seed {} ({} members):", group.seed, group.members.len());
        for member in &group.members {
            println!("  {}  similarity {:.3}", member.identity, member.similarity_to_seed);
        }
    }
    Ok(())
}

fn cmd_merge(client: &HttpCatalog, cache: &mut CatalogCache, rest: &[String]) -> Result<()> {
    let mut ids = Vec::new();
    let mut target = None;

    let mut i = 0;
    while i < rest.len() {
        if rest[i] == "--into" {
            let raw = rest
                .get(i + 1)
                .ok_or_else(|| anyhow!("--into requires an identity id"))?;
            target = Some(IdentityId(parse_id(raw)?));
            i += 1;
        } else {
            ids.push(IdentityId(parse_id(&rest[i])?));
        }
        i += 1;
    }

    let outcome = merge::merge_identities(client, cache, &ids, target)?;
    println!(
        "Merged {} identities into {} '{}' ({} embeddings moved, {} media links added)",
        outcome.absorbed.len() + 1,
        outcome.survivor,
        outcome.survivor_name,
        outcome.embeddings_moved,
        outcome.media_links_unioned,
    );
    if !outcome.refresh.media.is_empty() {
        println!("{} media items need a badge refresh", outcome.refresh.media.len());
    }
    Ok(())
}

fn cmd_set_primary(client: &HttpCatalog, rest: &[String]) -> Result<()> {
    let id = rest
        .first()
        .ok_or_else(|| anyhow!("set-primary requires an identity id"))?;
    let identity = IdentityId(parse_id(id)?);

    match primary::elect_primary(client, identity)? {
        Some(embedding) => println!("Primary embedding of {} is now {}", identity, embedding),
        None => println!("Identity {} has no embeddings", identity),
    }
    Ok(())
}

fn cmd_dedup_tag(
    client: &HttpCatalog,
    cache: &mut CatalogCache,
    config: &Config,
    rest: &[String],
) -> Result<()> {
    let mut media = Vec::new();
    for raw in rest {
        media.push(MediaId(parse_id(raw)?));
    }

    let outcome = dedup::tag_duplicate_group(client, cache, &config.dedup, &media)?;
    println!(
        "Group '{}': {} members, {} tagged, {} already tagged, {} failed",
        outcome.tag,
        outcome.members.len(),
        outcome.applied,
        outcome.already_tagged,
        outcome.failed.len(),
    );
    for retired in &outcome.retired_tags {
        println!("Retired empty group tag '{}'", retired);
    }
    for (media_id, error) in &outcome.failed {
        eprintln!("media {}: {}", media_id, error);
    }
    if outcome.is_partial() {
        std::process::exit(2);
    }
    Ok(())
}
