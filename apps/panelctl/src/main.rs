use anyhow::Result;
use clap::{Parser, Subcommand};
use panel_core::{load_settings, PanelClient};
use serde_json::{Map, Value};
use shared::{
    domain::{ActionMethod, ActionRequest, EngineType},
    protocol::EngineApiResult,
};

#[derive(Parser, Debug)]
#[command(about = "Operate pipeline engine tasks and nodes through the panel admin API")]
struct Cli {
    /// Overrides the configured admin API base URL.
    #[arg(long)]
    base_url: Option<String>,
    /// Overrides the configured CSRF token.
    #[arg(long)]
    csrf_token: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    TaskPause {
        engine: String,
        instance_id: String,
    },
    TaskResume {
        engine: String,
        instance_id: String,
    },
    TaskRevoke {
        engine: String,
        instance_id: String,
    },
    NodeRetry {
        engine: String,
        node_id: String,
        /// Replacement node inputs as a JSON value.
        #[arg(long)]
        inputs: Option<String>,
    },
    NodeSkip {
        engine: String,
        node_id: String,
    },
    NodeCallback {
        engine: String,
        node_id: String,
        /// Callback data as a JSON value.
        #[arg(long)]
        data: Option<String>,
        /// Node state version; the server resolves the current one when omitted.
        #[arg(long)]
        version: Option<String>,
    },
    NodeSkipExg {
        engine: String,
        node_id: String,
        #[arg(long)]
        flow_id: String,
    },
    NodeSkipCpg {
        engine: String,
        node_id: String,
        #[arg(long)]
        converge_gateway_id: String,
        #[arg(long = "flow-id")]
        flow_ids: Vec<String>,
    },
    NodeForcedFail {
        engine: String,
        node_id: String,
    },
    /// Issues a raw (version, action, path id) tuple and prints the raw
    /// status and body.
    Dispatch {
        version: String,
        action_name: String,
        path_id: String,
        #[arg(long, default_value = "post")]
        method: String,
        /// Request payload as a JSON object.
        #[arg(long)]
        data: Option<String>,
    },
}

fn parse_json_arg(raw: Option<String>) -> Result<Option<Value>> {
    raw.map(|text| serde_json::from_str(&text))
        .transpose()
        .map_err(Into::into)
}

fn print_envelope(envelope: &EngineApiResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(envelope)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let cli = Cli::parse();
    let mut settings = load_settings();
    if let Some(base_url) = cli.base_url {
        settings.base_url = base_url;
    }
    if let Some(token) = cli.csrf_token {
        settings.csrf_token = Some(token);
    }
    let client = PanelClient::new(&settings)?;

    match cli.command {
        Command::TaskPause {
            engine,
            instance_id,
        } => {
            let engine: EngineType = engine.parse()?;
            print_envelope(&client.task_pause(engine, &instance_id).await?)?;
        }
        Command::TaskResume {
            engine,
            instance_id,
        } => {
            let engine: EngineType = engine.parse()?;
            print_envelope(&client.task_resume(engine, &instance_id).await?)?;
        }
        Command::TaskRevoke {
            engine,
            instance_id,
        } => {
            let engine: EngineType = engine.parse()?;
            print_envelope(&client.task_revoke(engine, &instance_id).await?)?;
        }
        Command::NodeRetry {
            engine,
            node_id,
            inputs,
        } => {
            let engine: EngineType = engine.parse()?;
            let inputs = parse_json_arg(inputs)?;
            print_envelope(&client.node_retry(engine, &node_id, inputs).await?)?;
        }
        Command::NodeSkip { engine, node_id } => {
            let engine: EngineType = engine.parse()?;
            print_envelope(&client.node_skip(engine, &node_id).await?)?;
        }
        Command::NodeCallback {
            engine,
            node_id,
            data,
            version,
        } => {
            let engine: EngineType = engine.parse()?;
            let data = parse_json_arg(data)?;
            print_envelope(&client.node_callback(engine, &node_id, data, version).await?)?;
        }
        Command::NodeSkipExg {
            engine,
            node_id,
            flow_id,
        } => {
            let engine: EngineType = engine.parse()?;
            print_envelope(&client.node_skip_exg(engine, &node_id, &flow_id).await?)?;
        }
        Command::NodeSkipCpg {
            engine,
            node_id,
            converge_gateway_id,
            flow_ids,
        } => {
            let engine: EngineType = engine.parse()?;
            print_envelope(
                &client
                    .node_skip_cpg(engine, &node_id, &converge_gateway_id, &flow_ids)
                    .await?,
            )?;
        }
        Command::NodeForcedFail { engine, node_id } => {
            let engine: EngineType = engine.parse()?;
            print_envelope(&client.node_forced_fail(engine, &node_id).await?)?;
        }
        Command::Dispatch {
            version,
            action_name,
            path_id,
            method,
            data,
        } => {
            let method: ActionMethod = method.parse()?;
            let query = match parse_json_arg(data)? {
                Some(Value::Object(map)) => map,
                Some(_) => anyhow::bail!("--data must be a JSON object"),
                None => Map::new(),
            };
            let request = ActionRequest::new(version, action_name, method, path_id, query);
            let response = client.dispatch(&request).await?;
            println!("status: {}", response.status);
            println!("{}", String::from_utf8_lossy(&response.body));
        }
    }

    Ok(())
}
