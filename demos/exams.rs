//! Exam service demo: one handler group, three endpoints, request tracing.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example exams
//!
//! Try:
//!   curl http://localhost:8080/exams
//!   curl -X POST http://localhost:8080/exams/add -d '{"title":"Midterm"}'
//!   curl -X POST http://localhost:8080/exams/what \
//!        -d '{"id":1,"title":"x","date":"2024-01-01","extra":"ignored"}'
//!   curl http://localhost:8080/exams/add        # 405
//!   curl http://localhost:8080/unknown-path     # 404
//!
//! Settings come from an optional `gantry.toml` next to the binary and
//! `GANTRY_*` environment variables.

use chrono::NaiveDate;
use gantry::middleware::trace::TraceInterceptor;
use gantry::{App, Binding, Endpoint, HandlerGroup, Server, ServerConfig};
use serde::Deserialize;
use tracing::info;

const EXAMS: [&str; 4] = ["asdasd", "dsfsdfdsf", "sdfdsfdsf", "fsdfsdf"];

#[derive(Debug, Deserialize)]
struct NewExam {
    title: String,
}

#[derive(Debug, Deserialize)]
struct What {
    #[allow(dead_code)]
    id: Option<i64>,
    #[allow(dead_code)]
    title: Option<String>,
    #[allow(dead_code)]
    date: Option<NaiveDate>,
}

struct ExamController;

impl HandlerGroup for ExamController {
    fn base_path(&self) -> &str {
        "/exams"
    }

    fn endpoints(&self) -> Vec<Endpoint<Self>> {
        vec![
            // GET /exams
            Endpoint::get("").to(|_: &ExamController, _| Ok(EXAMS)),
            // POST /exams/add → "<title> -> <uuid>"
            Endpoint::post("/add")
                .bind(Binding::body::<NewExam>())
                .to(|_: &ExamController, mut args| {
                    let exam = args.body::<NewExam>()?;
                    info!(?exam, "request body");
                    Ok(format!("{} -> {}", exam.title, uuid::Uuid::new_v4()))
                }),
            // POST /exams/what, unknown fields in the body are ignored
            Endpoint::post("/what")
                .bind(Binding::body::<What>())
                .to(|_: &ExamController, mut args| {
                    let what = args.body::<What>()?;
                    info!(?what, "request body");
                    Ok(EXAMS)
                }),
        ]
    }
}

fn main() -> Result<(), gantry::Error> {
    tracing_subscriber::fmt::init();

    let config = ServerConfig::load_from("gantry")?;
    let app = App::builder()
        .config(&config)
        .interceptor(0, TraceInterceptor)
        .group(ExamController)
        .build()?;

    Server::run(&config, app)
}
