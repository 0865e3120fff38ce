use crate::Context;
use colored::Colorize;
use fleetpool_cloud::BackendKind;

pub async fn handle(
    ctx: &Context,
    selected: Option<&str>,
    show_all: bool,
    kind: Option<BackendKind>,
) -> anyhow::Result<()> {
    eprintln!(
        "{} {}",
        "Listing fleets in".blue(),
        ctx.conn.region.as_str().cyan()
    );

    let candidates = match kind {
        Some(kind) => {
            ctx.registry
                .backend(kind)
                .describe(&ctx.conn, selected, show_all)
                .await?
        }
        None => {
            ctx.registry
                .describe_all(&ctx.conn, selected, show_all)
                .await?
        }
    };

    if candidates.is_empty() {
        println!("{}", "No fleets found".dimmed());
        return Ok(());
    }

    println!("{}", format!("{:<3} {:<30} {}", "", "ID", "LABEL").bold());
    println!("{}", "─".repeat(80).dimmed());
    for candidate in candidates {
        // 色付け前に幅を揃える
        let id = format!("{:<30}", candidate.id);
        if candidate.selected {
            println!("{} {} {}", "*  ".green(), id.green().bold(), candidate.label);
        } else {
            println!("{:<3} {} {}", "", id, candidate.label);
        }
    }

    Ok(())
}
