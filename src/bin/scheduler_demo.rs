//! Small CLI that drives a `Scheduler<String>` over a synthetic tick
//! loop, seeding one-shot normal-priority timers from files found
//! under each directory argument.

use std::path::PathBuf;
use std::time::Duration;

use walkdir::WalkDir;

use phosphor_scheduler::{
    Arg, CallbackId, CallbackOutput, LogCrateSink, SchedulerConfig, SchedulerHandle, SystemClock,
};

fn seed_from_directory(scheduler: &SchedulerHandle<String>, dir: &PathBuf, now: f64) -> usize {
    let mut count = 0;
    for entry in WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = path.display().to_string();
        let delay = 1.0 + (count as f64) * 0.5;
        let scheduled = scheduler.schedule_normal(
            name.clone(),
            now + delay,
            CallbackId(1),
            move |target: &String, _args: &[Arg], _s: &SchedulerHandle<String>| {
                println!("fired: {target}");
                Ok(Box::new(()) as CallbackOutput)
            },
            Vec::new(),
        );
        if let Err(e) = scheduled {
            log::warn!("could not schedule {name}: {e}");
            continue;
        }
        count += 1;
    }
    count
}

fn main() {
    env_logger::init();

    let config = SchedulerConfig::load();
    let scheduler: SchedulerHandle<String> = SchedulerHandle::new(
        config,
        Box::new(SystemClock),
        Box::new(LogCrateSink),
    );

    let clock = SystemClock;
    use phosphor_scheduler::Clock;
    let start = clock.now();

    let mut seeded = 0;
    for arg in std::env::args().skip(1) {
        if arg.starts_with("--") {
            continue;
        }
        let path = PathBuf::from(&arg);
        if path.is_dir() {
            seeded += seed_from_directory(&scheduler, &path, start);
        } else {
            log::warn!("skipping non-directory argument: {arg}");
        }
    }

    if seeded == 0 {
        println!("no directories given; scheduling one synthetic timer");
        scheduler
            .schedule_normal(
                "synthetic".to_string(),
                start + 1.0,
                CallbackId(0),
                |target: &String, _args: &[Arg], _s: &SchedulerHandle<String>| {
                    println!("fired: {target}");
                    Ok(Box::new(()) as CallbackOutput)
                },
                Vec::new(),
            )
            .expect("empty queue always has room");
    }

    loop {
        let now = clock.now();
        if let Err(e) = scheduler.pump(now) {
            log::error!("pump failed: {e}");
        }
        match scheduler.time_until_next(now) {
            Some(wait) if wait > Duration::ZERO => std::thread::sleep(wait.min(Duration::from_millis(200))),
            Some(_) => {}
            None => break,
        }
    }
}
