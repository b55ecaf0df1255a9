use std::io::Read;
use std::path::Path;
use std::time::Duration;

use eyre::WrapErr;
use serde_json::Value as Json;
use sqlkit_db::{Connection, OpenFlag, OpenOptions};

use crate::cli::{Cli, Command};
use crate::json::parse_params;

/// Opens the database described by `cli`, runs its command and returns the
/// JSON document to print.
pub fn run(cli: &Cli) -> eyre::Result<Json> {
    let mut options =
        OpenOptions::new().flags(cli.flags.iter().copied().map(OpenFlag::from).collect());
    if let Some(ms) = cli.busy_timeout_ms {
        options = options.busy_timeout(Duration::from_millis(ms));
    }
    let mut conn = Connection::open_with(&cli.database, options)
        .wrap_err_with(|| format!("failed to open {}", cli.database))?;

    let output = match &cli.command {
        Command::Exec { sql, params, batch } => {
            let params = parse_params(params, batch.as_deref())?;
            serde_json::to_value(conn.execute(sql, &params)?)?
        }
        Command::Script { file } => {
            let script = read_script(file)?;
            serde_json::to_value(conn.execute_script(&script)?)?
        }
        Command::Readonly => Json::Bool(conn.readonly()?),
    };

    conn.close()?;
    Ok(output)
}

fn read_script(file: &Path) -> eyre::Result<String> {
    if file == Path::new("-") {
        let mut script = String::new();
        std::io::stdin()
            .read_to_string(&mut script)
            .wrap_err("failed to read script from stdin")?;
        return Ok(script);
    }
    std::fs::read_to_string(file).wrap_err_with(|| format!("failed to read {}", file.display()))
}
