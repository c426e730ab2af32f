//! `epistemic-planner`: the CLI entry point tying the domain reader,
//! search engine, portfolio runner, plan validator, and dataset dumper
//! together (spec.md §6 "CLI").

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use epistemic_harness::cli::Cli;
use epistemic_harness::error::HarnessError;
use epistemic_harness::{dataset, domain_text, gnn, logging, portfolio, validate};
use epistemic_kernel::state::KripkeState;
use epistemic_kernel::world::KripkeWorldStore;
use epistemic_search::engine;
use epistemic_search::heuristic::HeuristicManager;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("error: {err}");
            ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(255))
        }
    }
}

fn run(cli: &Cli) -> Result<(), HarnessError> {
    if cli.log {
        logging::init_file(&cli.domain_file)?;
    } else {
        logging::init_stderr();
    }

    let source = std::fs::read_to_string(&cli.domain_file).map_err(|err| {
        HarnessError::DomainFileOpen {
            path: cli.domain_file.display().to_string(),
            detail: err.to_string(),
        }
    })?;
    let (domain, fluent_count) = domain_text::parse_domain(&source)?;
    domain.validate()?;

    let store = Arc::new(KripkeWorldStore::new());
    let start = KripkeState::build_initial(store, &domain, fluent_count)?;

    if cli.execute || !cli.execute_actions.is_empty() {
        return run_validate(cli, &domain, start);
    }
    if let Some(size) = cli.dataset_size {
        return run_dataset(cli, &domain, start, size);
    }
    if cli.portfolio {
        return run_portfolio(cli, &domain, start);
    }
    run_single(cli, &domain, start)
}

fn run_single(
    cli: &Cli,
    domain: &epistemic_kernel::domain::Domain,
    start: KripkeState,
) -> Result<(), HarnessError> {
    let policy = cli.search_policy()?;
    let goal = vec![domain.goal.clone()];

    if cli.parallel > 1 && policy.strategy == epistemic_search::policy::Strategy::Bfs {
        let outcome = epistemic_search::parallel::run_parallel_bfs(
            domain,
            goal,
            start,
            cli.parallel,
            policy.bisimulation,
            policy.check_visited,
        );
        return report_outcome(cli, domain, &outcome);
    }

    if policy.heuristic == epistemic_search::heuristic::HeuristicKind::Gnn {
        let script = cli.gnn_script.clone().ok_or_else(|| HarnessError::ArgumentParse {
            detail: "--heuristic GNN requires --gnn_script".to_string(),
        })?;
        let oracle = Arc::new(gnn::GnnProcessOracle::new(script, cli.gnn_work_dir.clone()));
        let heuristic = HeuristicManager::new(domain, goal.clone(), policy.heuristic)
            .with_oracle(Box::new(Arc::clone(&oracle)));
        let outcome = engine::run_with_heuristic(domain, goal, start, &policy, heuristic, None);
        if let Some(err) = oracle.take_fatal_error() {
            return Err(err);
        }
        return report_outcome(cli, domain, &outcome);
    }

    let outcome = engine::run(domain, goal, start, &policy);
    report_outcome(cli, domain, &outcome)
}

fn run_portfolio(
    cli: &Cli,
    domain: &epistemic_kernel::domain::Domain,
    start: KripkeState,
) -> Result<(), HarnessError> {
    let configs = portfolio::default_configs();
    let (results, winner) = portfolio::run_portfolio(domain, vec![domain.goal.clone()], &start, &configs);
    for result in &results {
        log::info!("{result}");
    }
    match winner {
        Some(index) => report_outcome(cli, domain, &results[index].outcome),
        None => {
            println!("no configuration found a plan");
            Ok(())
        }
    }
}

fn run_validate(
    cli: &Cli,
    domain: &epistemic_kernel::domain::Domain,
    start: KripkeState,
) -> Result<(), HarnessError> {
    let action_names = if cli.execute {
        let path = cli.plan_file.as_ref().ok_or_else(|| HarnessError::ArgumentParse {
            detail: "--execute requires --plan-file".to_string(),
        })?;
        validate::read_plan_file(path)?
    } else {
        cli.execute_actions.clone()
    };

    let steps = validate::replay_plan(domain, start, &action_names)?;
    println!("plan validated: {} steps", steps.len());
    if let Some(results_file) = &cli.results_file {
        logging::truncate(results_file)?;
        for (index, step) in steps.iter().enumerate() {
            logging::append_line(results_file, &format!("{index}: {}", step.action_name))?;
        }
    }
    Ok(())
}

fn run_dataset(
    _cli: &Cli,
    domain: &epistemic_kernel::domain::Domain,
    start: KripkeState,
    size: usize,
) -> Result<(), HarnessError> {
    let dumper = dataset::DatasetDumper::new(PathBuf::from("dataset"))?;
    dumper.dump_goal_tree(domain, &domain.goal)?;

    let mut state = start;
    for _ in 0..size {
        dumper.dump_state(domain, &state)?;
        let next = domain
            .actions
            .values()
            .find_map(|action| state.apply_action(action).ok());
        match next {
            Some(next_state) => state = next_state,
            None => break,
        }
    }
    println!("dataset written under dataset/");
    Ok(())
}

fn report_outcome(
    cli: &Cli,
    domain: &epistemic_kernel::domain::Domain,
    outcome: &engine::SearchOutcome,
) -> Result<(), HarnessError> {
    use epistemic_search::error::TerminationReason;
    match &outcome.reason {
        TerminationReason::GoalReached { plan_length } => {
            let plan = outcome.plan.clone().unwrap_or_default();
            println!("plan found, length {plan_length}, expanded {}", outcome.expanded);
            for action_id in &plan {
                let name = domain.grounder.action_name(*action_id).unwrap_or("?");
                println!("  {name}");
            }
            if let Some(results_file) = &cli.results_file {
                logging::truncate(results_file)?;
                for action_id in &plan {
                    let name = domain.grounder.action_name(*action_id).unwrap_or("?");
                    logging::append_line(results_file, name)?;
                }
            }
        }
        TerminationReason::FrontierExhausted { expanded } => {
            println!("no plan found, expanded {expanded}");
        }
        TerminationReason::InitialStateIsGoal => {
            println!("initial state already satisfies the goal");
            return Err(HarnessError::InitialStateIsGoal);
        }
        TerminationReason::Cancelled { expanded } => {
            println!("search cancelled after expanding {expanded} states");
        }
    }
    Ok(())
}
