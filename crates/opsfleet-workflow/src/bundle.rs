use chrono::Utc;
use opsfleet_core::OpsfleetResult;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::info;

const DOCKERFILE: &str = "\
FROM rust:1.80-slim AS build
WORKDIR /app
COPY . /app
RUN cargo build --release
FROM debian:bookworm-slim
COPY --from=build /app/target/release/app /usr/local/bin/app
CMD [\"app\"]
";

const COMPOSE: &str = "\
services:
  app:
    build: .
    ports:
      - '8080:8080'
    environment:
      - ENV=production
    depends_on:
      - postgres
  postgres:
    image: postgres:15
    restart: always
    environment:
      POSTGRES_PASSWORD_FILE: /run/secrets/pg_password
    volumes:
      - postgres-data:/var/lib/postgresql/data
volumes:
  postgres-data:
";

const CI_WORKFLOW: &str = "\
name: modernization-ci
on:
  push:
    branches: [ main ]
  pull_request:
jobs:
  build:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4
      - uses: dtolnay/rust-toolchain@stable
      - run: cargo test
      - run: cargo install cargo-audit && cargo audit
      - run: docker build -t modernized .
";

/// Writes deployment packaging assets for the final workflow phase.
///
/// Artifact content is boilerplate; what the workflow record keeps is the
/// artifact path list, relative to the bundle root.
pub struct ArtifactBundler {
    output_root: PathBuf,
}

impl ArtifactBundler {
    /// Bundler writing under `output_root`.
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }

    /// Generate a named bundle and return its artifact paths, relative to
    /// the output root.
    pub async fn generate_bundle(
        &self,
        bundle_name: &str,
        project_root: &Path,
        metadata: serde_json::Value,
    ) -> OpsfleetResult<Vec<String>> {
        let bundle_dir = self.output_root.join(bundle_name);
        tokio::fs::create_dir_all(&bundle_dir).await?;

        let mut artifacts = Vec::new();
        artifacts.push(self.write(&bundle_dir.join("Dockerfile"), DOCKERFILE).await?);
        artifacts.push(
            self.write(&bundle_dir.join("docker-compose.yml"), COMPOSE)
                .await?,
        );

        let workflow_dir = bundle_dir.join(".github").join("workflows");
        tokio::fs::create_dir_all(&workflow_dir).await?;
        artifacts.push(
            self.write(&workflow_dir.join("modernization-ci.yml"), CI_WORKFLOW)
                .await?,
        );

        let manifest = json!({
            "generated_at": Utc::now().to_rfc3339(),
            "project_root": project_root.display().to_string(),
            "metadata": metadata,
        });
        artifacts.push(
            self.write(
                &bundle_dir.join("bundle.json"),
                &serde_json::to_string_pretty(&manifest)?,
            )
            .await?,
        );

        info!(bundle = bundle_name, count = artifacts.len(), "bundle generated");
        Ok(artifacts)
    }

    async fn write(&self, path: &Path, content: &str) -> OpsfleetResult<String> {
        tokio::fs::write(path, content).await?;
        Ok(path
            .strip_prefix(&self.output_root)
            .unwrap_or(path)
            .display()
            .to_string())
    }
}
