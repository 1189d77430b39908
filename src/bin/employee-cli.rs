use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use rand::Rng;
use reqwest::Client;
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "employee-cli")]
#[command(about = "Client and load driver for the employee service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask for a greeting
    Hello {
        name: Option<String>,
    },
    /// Create an employee
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
    },
    /// Fetch one employee
    Get {
        id: i64,
    },
    /// List all employees
    List,
    /// Update fields of an employee
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Run create → fetch by id → fetch all from concurrent workers
    Load {
        #[arg(long, default_value_t = 10)]
        threads: usize,
        #[arg(long, default_value_t = 10)]
        iterations: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = Client::new();
    let base = cli.url.trim_end_matches('/').to_string();

    match cli.command {
        Commands::Hello { name } => {
            let url = match name {
                Some(name) => format!("{base}/hello/{name}"),
                None => format!("{base}/hello"),
            };
            print_response(client.get(url).send().await?).await?;
        }
        Commands::Create { name, email, phone } => {
            let res = client
                .post(format!("{base}/employee"))
                .json(&json!({ "name": name, "email": email, "phone": phone }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Get { id } => {
            print_response(client.get(format!("{base}/employee/{id}")).send().await?).await?;
        }
        Commands::List => {
            print_response(client.get(format!("{base}/employee")).send().await?).await?;
        }
        Commands::Update {
            id,
            name,
            email,
            phone,
        } => {
            let mut body = serde_json::Map::new();
            for (field, value) in [("name", name), ("email", email), ("phone", phone)] {
                if let Some(value) = value {
                    body.insert(field.to_string(), Value::String(value));
                }
            }
            let res = client
                .put(format!("{base}/employee/{id}"))
                .json(&body)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Load {
            threads,
            iterations,
        } => {
            run_load(client, base, threads, iterations).await;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
    }

    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) if text.is_empty() => {}
        Err(_) => println!("{}", text),
    }
    Ok(())
}

fn random_from(alphabet: &[u8], len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect()
}

async fn run_load(client: Client, base: String, threads: usize, iterations: usize) {
    let start = Instant::now();
    let mut workers = Vec::with_capacity(threads);

    for _ in 0..threads {
        let client = client.clone();
        let base = base.clone();
        workers.push(tokio::spawn(async move {
            let mut failures = 0usize;
            for _ in 0..iterations {
                if let Err(e) = load_iteration(&client, &base).await {
                    eprintln!("iteration failed: {}", e);
                    failures += 1;
                }
            }
            failures
        }));
    }

    let mut failures = 0;
    for worker in workers {
        failures += worker.await.unwrap_or(iterations);
    }

    let total = threads * iterations;
    let elapsed: Duration = start.elapsed();
    println!("Iterations: {}", total);
    println!("Failures:   {}", failures);
    println!("Elapsed:    {:?}", elapsed);
    if !elapsed.is_zero() {
        // Three requests per iteration.
        println!("RPS:        {:.1}", (total * 3) as f64 / elapsed.as_secs_f64());
    }
}

async fn load_iteration(client: &Client, base: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let body = json!({
        "name": format!("name_{}", random_from(b"abcdef0123456789", 8)),
        "email": format!("email_{}@example.com", random_from(b"abcdef0123456789", 6)),
        "phone": random_from(b"0123456789", 10),
    });

    let created: Value = client
        .post(format!("{base}/employee"))
        .json(&body)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let id = created["id"]
        .as_i64()
        .ok_or_else(|| format!("empId is invalid: {}", created["id"]))?;

    client
        .get(format!("{base}/employee/{id}"))
        .send()
        .await?
        .error_for_status()?;

    client
        .get(format!("{base}/employee"))
        .send()
        .await?
        .error_for_status()?;

    Ok(())
}
