// tests/flow_stages.rs

use assetdag::cli::Command;
use assetdag::flow::{Flow, FlowGraph};
use assetdag::tasks::TaskName;

#[test]
fn build_runs_clean_then_images_and_favicon_then_minify() {
    let graph = FlowGraph::from_flow(&Flow::build());

    assert_eq!(
        graph.stages(),
        vec![
            vec![TaskName::Clean],
            vec![TaskName::BuildImg, TaskName::Favicon],
            vec![TaskName::Minify],
        ]
    );
    assert!(graph.concurrent(TaskName::BuildImg, TaskName::Favicon));
    assert!(!graph.concurrent(TaskName::Clean, TaskName::Minify));
}

#[test]
fn watch_compiles_before_serving() {
    let graph = FlowGraph::from_flow(&Flow::watch());

    assert_eq!(
        graph.stages(),
        vec![
            vec![TaskName::BuildScss, TaskName::BuildJs],
            vec![TaskName::BuildCss],
            vec![TaskName::BrowserSync, TaskName::WatchFiles],
        ]
    );
}

#[test]
fn single_task_commands_have_one_stage() {
    for (command, task) in [
        (Command::BuildScss, TaskName::BuildScss),
        (Command::Favicon, TaskName::Favicon),
        (Command::BrowserSync, TaskName::BrowserSync),
    ] {
        let flow = Flow::for_command(command);
        assert_eq!(flow, Flow::task(task));
        assert_eq!(FlowGraph::from_flow(&flow).stages(), vec![vec![task]]);
    }
}

#[test]
fn flows_render_with_task_names() {
    assert_eq!(
        Flow::build().to_string(),
        "series(clean, parallel(buildImg, favicon), minify)"
    );
    assert_eq!(
        Flow::watch().to_string(),
        "series(parallel(buildScss, buildJs), buildCss, parallel(watchFiles, browserSync))"
    );
}
