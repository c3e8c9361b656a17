#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use chrono::NaiveDate;
use gantry::{App, AppBuilder, Binding, Endpoint, GroupDescriptor, HandlerGroup, QueryShape, Response};
use http_body_util::Full;
use serde::{Deserialize, Serialize};

pub const EXAMS: [&str; 4] = ["asdasd", "dsfsdfdsf", "sdfdsfdsf", "fsdfsdf"];

#[derive(Debug, Deserialize)]
pub struct NewExam {
    pub title: String,
}

#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub struct What {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
}

/// The exam handler group, counting how often any of its handlers ran.
#[derive(Default)]
pub struct Exams {
    pub calls: AtomicUsize,
}

impl Exams {
    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl HandlerGroup for Exams {
    fn base_path(&self) -> &str {
        "/exams"
    }

    fn endpoints(&self) -> Vec<Endpoint<Self>> {
        vec![
            Endpoint::get("").to(|exams: &Exams, _| {
                exams.hit();
                Ok(EXAMS)
            }),
            Endpoint::post("/add")
                .bind(Binding::body::<NewExam>())
                .to(|exams: &Exams, mut args| {
                    exams.hit();
                    let exam = args.body::<NewExam>()?;
                    Ok(format!("{} -> {}", exam.title, uuid::Uuid::new_v4()))
                }),
            Endpoint::post("/what")
                .bind(Binding::body::<What>())
                .to(|exams: &Exams, mut args| {
                    exams.hit();
                    let _what = args.body::<What>()?;
                    Ok(EXAMS)
                }),
            Endpoint::get("/search")
                .bind(Binding::query("term", QueryShape::Str).required())
                .bind(Binding::query("limit", QueryShape::Int).default_value("2"))
                .bind(Binding::query("from", QueryShape::Date))
                .to(|exams: &Exams, mut args| {
                    exams.hit();
                    let term = args.query_str()?.unwrap_or_default();
                    let limit = args.query_int()?.unwrap_or(0);
                    let from = args.query_date()?;
                    Ok(serde_json::json!({ "term": term, "limit": limit, "from": from }))
                }),
            Endpoint::get("/echo-path")
                .bind(Binding::context())
                .to(|_: &Exams, mut args| Ok(args.context()?.path().to_owned())),
        ]
    }
}

impl Exams {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Registers a shared `Exams` so the test keeps a handle on its counter.
pub fn with_exams(builder: AppBuilder, exams: &Arc<Exams>) -> AppBuilder {
    builder.group(GroupDescriptor::new(exams.base_path(), Arc::clone(exams), exams.endpoints()))
}

pub fn exams_app() -> (App, Arc<Exams>) {
    let exams = Arc::new(Exams::default());
    let app = with_exams(App::builder(), &exams).build().unwrap();
    (app, exams)
}

pub fn request(method: &str, uri: &str, body: &'static str) -> http::Request<Full<Bytes>> {
    http::Request::builder()
        .method(method)
        .uri(uri)
        .body(Full::new(Bytes::from_static(body.as_bytes())))
        .unwrap()
}

pub fn body_str(res: &Response) -> &str {
    std::str::from_utf8(res.body()).unwrap()
}
