//! paperbridge search - Run one blocking search

use clap::Args;

use crate::app::AppContext;
use crate::cancel::CancelToken;
use crate::cli::output::{self, OutputFormat};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// A DOI for an exact lookup, anything else is matched against titles
    pub term: String,

    /// Offset of the first result (for paging)
    #[arg(long, default_value_t = 0)]
    pub offset: usize,

    /// Route through the cloud broker instead of the local one
    #[arg(long)]
    pub cloud: bool,
}

pub fn run(ctx: &AppContext, args: &SearchArgs) -> Result<()> {
    let service = ctx.search_service(args.cloud)?;

    let cancel = CancelToken::new();
    watch_ctrl_c(cancel.clone());

    let results = service.search_with_cancel(&args.term, args.offset, args.cloud, &cancel)?;

    if ctx.output_format == OutputFormat::Json {
        return output::emit_json(&output::robot_ok(&results));
    }
    print!("{}", output::render_result_set(&results, ctx.output_format));
    Ok(())
}

/// Cancel `cancel` on Ctrl-C. The watcher thread dies with the process.
fn watch_ctrl_c(cancel: CancelToken) {
    let spawned = std::thread::Builder::new()
        .name("ctrl-c".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    tracing::debug!(error = %err, "no signal runtime; Ctrl-C will not cancel");
                    return;
                }
            };
            if runtime.block_on(tokio::signal::ctrl_c()).is_ok() {
                tracing::info!("interrupted; cancelling search");
                cancel.cancel();
            }
        });
    if let Err(err) = spawned {
        tracing::debug!(error = %err, "failed to spawn Ctrl-C watcher");
    }
}
