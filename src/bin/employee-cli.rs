use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use employee_api::http::MessageBody;
use reqwest::header::CONTENT_DISPOSITION;
use serde_json::{json, Map, Number, Value};
use url::Url;

#[derive(Parser)]
#[command(name = "employee-cli")]
#[command(about = "Command-line client for the employee API", long_about = None)]
struct Cli {
    #[arg(short, long, env = "EMPLOYEE_API_URL", default_value = "http://localhost:5000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the API is up
    Health,
    /// List all employees, newest first
    List,
    /// Download the CSV export
    Export {
        /// Output file (defaults to the server-suggested name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Create an employee
    Create {
        #[arg(long)]
        emp_id: String,
        #[arg(long)]
        email: String,
        #[command(flatten)]
        fields: OptionalFields,
    },
    /// Replace name, email, department and salary of an employee
    Update {
        emp_id: String,
        #[arg(long)]
        email: Option<String>,
        #[command(flatten)]
        fields: OptionalFields,
    },
    /// Delete an employee
    Delete { emp_id: String },
}

#[derive(Args)]
struct OptionalFields {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    department: Option<String>,
    #[arg(long)]
    salary: Option<Number>,
}

impl OptionalFields {
    fn into_json(self, body: &mut Map<String, Value>) {
        body.insert("name".into(), json!(self.name));
        body.insert("department".into(), json!(self.department));
        body.insert("salary".into(), json!(self.salary));
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');
    let employees = format!("{}/api/employees", base);

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/", base)).send().await?;
            let status = res.status();
            let text = res.text().await?;
            if !status.is_success() {
                return fail(status, &text);
            }
            println!("{}", text);
        }
        Commands::List => {
            let res = client.get(&employees).send().await?;
            print_response(res).await?;
        }
        Commands::Export { output } => {
            let res = client.get(format!("{}/export/csv", employees)).send().await?;
            let status = res.status();
            if !status.is_success() {
                let text = res.text().await?;
                return fail(status, &text);
            }
            let suggested = res
                .headers()
                .get(CONTENT_DISPOSITION)
                .and_then(|v| v.to_str().ok())
                .and_then(attachment_filename)
                .unwrap_or_else(|| "employees.csv".to_string());
            let path = output.unwrap_or_else(|| PathBuf::from(suggested));
            let bytes = res.bytes().await?;
            std::fs::write(&path, &bytes)?;
            println!("Wrote {} bytes to {}", bytes.len(), path.display());
        }
        Commands::Create { emp_id, email, fields } => {
            let mut body = Map::new();
            body.insert("emp_id".into(), json!(emp_id));
            body.insert("email".into(), json!(email));
            fields.into_json(&mut body);
            let res = client.post(&employees).json(&body).send().await?;
            print_response(res).await?;
        }
        Commands::Update { emp_id, email, fields } => {
            let mut body = Map::new();
            body.insert("email".into(), json!(email));
            fields.into_json(&mut body);
            let res = client
                .put(employee_url(base, &emp_id)?)
                .json(&body)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Delete { emp_id } => {
            let res = client.delete(employee_url(base, &emp_id)?).send().await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

/// `<base>/api/employees/<emp_id>` with `emp_id` encoded as one path segment.
fn employee_url(base: &str, emp_id: &str) -> Result<Url, Box<dyn std::error::Error>> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| format!("API URL '{}' cannot take a path", base))?
        .pop_if_empty()
        .extend(["api", "employees", emp_id]);
    Ok(url)
}

fn attachment_filename(disposition: &str) -> Option<String> {
    let start = disposition.find("filename=")? + "filename=".len();
    let name = disposition[start..].trim().trim_matches('"');
    (!name.is_empty()).then(|| name.to_string())
}

fn fail(status: reqwest::StatusCode, text: &str) -> Result<(), Box<dyn std::error::Error>> {
    let message = serde_json::from_str::<MessageBody>(text)
        .map(|b| b.message)
        .unwrap_or_else(|_| text.to_string());
    eprintln!("Error ({}): {}", status, message);
    std::process::exit(1);
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        return fail(status, &text);
    }

    let json: Value = serde_json::from_str(&text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
