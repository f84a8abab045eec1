use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use common::{
    dataset::DatasetFormat, CancelResponse, ErrorBody, SubmitResponse, TaskResults, TaskState,
    TaskStatus, TaskSummary,
};
use reqwest::{Client, Response};
use std::{env, path::PathBuf, time::Duration};

/// - En Docker: SERVER_URL=http://server:8080
/// - Local: default http://localhost:8080
fn server_base_url() -> String {
    env::var("SERVER_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "CLI para generar imágenes de fondo a partir de un CSV o xlsx")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sube un CSV o xlsx y crea una tarea de generación
    Submit {
        #[arg(value_name = "ARCHIVO")]
        file: PathBuf,

        /// API key de la API de imágenes (si no, usa la del server)
        #[arg(long, env = "OPENAI_API_KEY")]
        api_key: Option<String>,
    },
    /// Consulta el estado de una tarea
    Status {
        #[arg(value_name = "TASK_ID")]
        id: String,
    },
    /// Pide cancelar una tarea en curso
    Cancel {
        #[arg(value_name = "TASK_ID")]
        id: String,
    },
    /// Lista las imágenes generadas por una tarea terminada
    Results {
        #[arg(value_name = "TASK_ID")]
        id: String,
    },
    /// Lista todas las tareas del server
    List,
    /// Descarga el zip con las imágenes de una tarea
    Download {
        #[arg(value_name = "TASK_ID")]
        id: String,

        #[arg(long, default_value = "background_images.zip")]
        out: PathBuf,
    },
    /// Consulta el estado periódicamente hasta que la tarea termine
    Watch {
        #[arg(value_name = "TASK_ID")]
        id: String,

        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },
}

/// Línea de progreso, ej: "[#####-----]  50% (1/2) running"
fn progress_line(st: &TaskState) -> String {
    const WIDTH: usize = 20;
    let filled = (st.percentage.min(100) as usize * WIDTH) / 100;
    format!(
        "[{}{}] {:>3}% ({}/{}) {}",
        "#".repeat(filled),
        "-".repeat(WIDTH - filled),
        st.percentage,
        st.generated,
        st.total,
        st.status
    )
}

fn print_state(id: &str, st: &TaskState) {
    println!("Tarea:");
    println!("  id: {}", id);
    println!("  estado: {}", st.status);
    println!("  imágenes: {}/{}", st.generated, st.total);
    println!("  progreso: {}%", st.percentage);
    if let Some(ref msg) = st.error_message {
        println!("  error: {}", msg);
    }
    println!("  creada: {}", st.created_at);
    if let Some(ref done) = st.finished_at {
        println!("  finalizada: {}", done);
    }
}

/// Convierte una respuesta no exitosa en error con el mensaje del server.
async fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = match resp.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => "(sin detalle)".to_string(),
    };
    bail!("el server respondió {}: {}", status, message)
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let client = Client::new();
    let base_url = server_base_url();

    match cli.command {
        Commands::Submit { file, api_key } => {
            let csv = tokio::fs::read(&file)
                .await
                .with_context(|| format!("no se pudo leer {}", file.display()))?;

            let mut req = client
                .post(format!("{}/api/v1/tasks", base_url))
                .header("content-type", DatasetFormat::from_path(&file).content_type())
                .body(csv);
            if let Some(key) = api_key {
                req = req.header("x-api-key", key);
            }

            let submitted: SubmitResponse = check(req.send().await?).await?.json().await?;
            println!("Tarea creada:");
            println!("  id: {}", submitted.task_id);
            println!("  filas: {}", submitted.total);
        }

        Commands::Status { id } => {
            let url = format!("{}/api/v1/tasks/{}", base_url, id);
            let st: TaskState = check(client.get(&url).send().await?).await?.json().await?;
            print_state(&id, &st);
        }

        Commands::Cancel { id } => {
            let url = format!("{}/api/v1/tasks/{}/cancel", base_url, id);
            let resp: CancelResponse = check(client.post(&url).send().await?).await?.json().await?;
            println!("Cancelación pedida para {} (estado: {})", resp.task_id, resp.status);
        }

        Commands::Results { id } => {
            let url = format!("{}/api/v1/tasks/{id}/results", base_url);
            let results: TaskResults = check(client.get(&url).send().await?).await?.json().await?;

            println!("Resultados para tarea {}:", results.task_id);
            println!("  directorio de salida: {}", results.output_dir);
            if results.files.is_empty() {
                println!("  (sin imágenes)");
            } else {
                println!("  archivos:");
                for f in results.files {
                    println!("    - {}", f);
                }
            }
        }

        Commands::List => {
            let url = format!("{}/api/v1/tasks", base_url);
            let tasks: Vec<TaskSummary> = check(client.get(&url).send().await?).await?.json().await?;
            if tasks.is_empty() {
                println!("No hay tareas.");
            }
            for t in tasks {
                println!("{}  {}", t.task_id, progress_line(&t.state));
            }
        }

        Commands::Download { id, out } => {
            let url = format!("{}/api/v1/tasks/{id}/archive", base_url);
            let bytes = check(client.get(&url).send().await?).await?.bytes().await?;
            tokio::fs::write(&out, &bytes)
                .await
                .with_context(|| format!("no se pudo escribir {}", out.display()))?;
            println!("Zip guardado en {} ({} bytes)", out.display(), bytes.len());
        }

        Commands::Watch { id, interval_ms } => {
            let url = format!("{}/api/v1/tasks/{}", base_url, id);
            loop {
                let st: TaskState = check(client.get(&url).send().await?).await?.json().await?;
                println!("{}", progress_line(&st));

                if st.status != TaskStatus::Running {
                    print_state(&id, &st);
                    break;
                }
                tokio::time::sleep(Duration::from_millis(interval_ms)).await;
            }
        }
    }

    Ok(())
}
