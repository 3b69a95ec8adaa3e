// tests/build_pipeline.rs

mod common;
use crate::common::builders::ConfigFileBuilder;
use crate::common::{context, init_tracing, read, sample_png, write};

use std::path::Path;

use tempfile::TempDir;

use assetdag::errors::AssetdagError;
use assetdag::flow::Flow;
use assetdag::tasks::{TaskName, run_task};

const INDEX: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <!-- build:css css/app.min.css -->
    <link rel="stylesheet" href="css/base.css">
    <link rel="stylesheet" href="css/app.css">
    <!-- endbuild -->
  </head>
  <body>
    <img src="media/img/logo.svg">
    <!-- build:js js/app.min.js -->
    <script src="js/lib/helpers.js"></script>
    <script src="js/app.js"></script>
    <!-- endbuild -->
    <!-- build:remove -->
    <script src="http://localhost:3000/__assetdag/client.js"></script>
    <!-- endbuild -->
  </body>
</html>
"#;

const LOGO: &str = "<!-- exported -->\n<svg width=\"8\" height=\"8\">\n  <g>\n    <circle r=\"4\"/>\n  </g>\n</svg>\n";

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "src/index.html", INDEX);
    write(root, "src/css/base.css", "body { margin: 0; }");
    write(root, "src/css/app.css", ".card { user-select: none; }");
    write(root, "src/js/lib/helpers.js", "function double(x) {\n  return x * 2;\n}\n");
    write(root, "src/js/app.js", "// entry point\nvar total = double(21);\n");
    write(root, "src/media/img/logo.svg", LOGO);
    write(root, "src/media/img/photos/tile.png", sample_png());
    write(root, "src/favicon.ico", b"\x00\x00\x01\x00fake-icon");
    write(root, "dist/stale.txt", "left over from an older build");
    dir
}

#[tokio::test]
async fn build_produces_a_fresh_distribution() {
    init_tracing();
    let dir = project();
    let root = dir.path();
    let ctx = context(root, ConfigFileBuilder::new().memory_cache().build());

    Flow::build().run(ctx).await.unwrap();

    assert!(!root.join("dist/stale.txt").exists());

    let html = read(root, "dist/index.html");
    assert!(html.contains(r#"<link rel="stylesheet" href="css/app.min.css">"#));
    assert!(html.contains(r#"<script src="js/app.min.js"></script>"#));
    assert!(!html.contains("client.js"));
    assert!(!html.contains('\n'));

    let css = read(root, "dist/css/app.min.css");
    assert!(css.contains("margin:0"));
    assert!(css.contains("-webkit-user-select:none"));

    let js = read(root, "dist/js/app.min.js");
    assert!(js.contains("function double(x)"));
    assert!(js.contains("double(21)"));
    assert!(!js.contains("entry point"));

    let logo = read(root, "dist/media/img/logo.svg");
    assert!(!logo.contains("exported"));
    assert!(!logo.contains("<g>"));

    let tile_in = image::load_from_memory(&sample_png()).unwrap().to_rgba8();
    let tile_out = image::open(root.join("dist/media/img/photos/tile.png")).unwrap().to_rgba8();
    assert_eq!(tile_in.as_raw(), tile_out.as_raw());

    assert_eq!(
        std::fs::read(root.join("dist/favicon.ico")).unwrap(),
        b"\x00\x00\x01\x00fake-icon"
    );
}

#[tokio::test]
async fn missing_favicon_fails_the_build_after_images_finish() {
    init_tracing();
    let dir = project();
    let root = dir.path();
    std::fs::remove_file(root.join("src/favicon.ico")).unwrap();
    let ctx = context(root, ConfigFileBuilder::new().memory_cache().build());

    let err = Flow::build().run(ctx).await.unwrap_err();

    match err {
        AssetdagError::TaskFailed { task, .. } => assert_eq!(task, TaskName::Favicon),
        other => panic!("expected TaskFailed, got {other:?}"),
    }
    // The sibling branch still ran to completion; `minify` never started.
    assert!(root.join("dist/media/img/logo.svg").exists());
    assert!(!root.join("dist/index.html").exists());
}

#[tokio::test]
async fn clean_is_idempotent() {
    let dir = project();
    let root = dir.path();
    let ctx = context(root, ConfigFileBuilder::new().build());

    run_task(ctx.clone(), TaskName::Clean).await.unwrap();
    assert!(!root.join("dist").exists());
    run_task(ctx, TaskName::Clean).await.unwrap();
    assert!(!root.join("dist").exists());
    assert!(Path::new(&root.join("src/index.html")).exists());
}

#[tokio::test]
async fn minify_without_build_blocks_copies_markup() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "src/pages/about.html", "<html>\n  <body>\n    <p>About</p>\n  </body>\n</html>\n");
    let ctx = context(root, ConfigFileBuilder::new().minify_html(false).build());

    let report = run_task(ctx, TaskName::Minify).await.unwrap();

    assert_eq!(report.written, 1);
    assert_eq!(
        read(root, "dist/pages/about.html"),
        "<html>\n  <body>\n    <p>About</p>\n  </body>\n</html>\n"
    );
}
