use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use uirobot::services::{ScrollPolicy, value};
use uirobot::widgets::ListBox;
use uirobot::{Rect, Robot, RobotSettings, WidgetAccess};

fn robot() -> Robot {
    Robot::headless(RobotSettings {
        delay_between_events: 0,
        ..RobotSettings::default()
    })
    .expect("headless toolkit")
}

fn query_round_trip(c: &mut Criterion) {
    let robot = robot();
    let list = robot
        .add_widget(|| ListBox::new("names", Rect::new(0, 0, 100, 200), 20, ["A", "B", "C"]))
        .expect("add widget");

    c.bench_function("query_round_trip", |b| {
        b.iter(|| {
            robot
                .executor()
                .query(move || list.with(|l| black_box(l.items().len())))
                .expect("query")
        });
    });
}

fn idle_barrier_when_idle(c: &mut Criterion) {
    let robot = robot();

    c.bench_function("idle_barrier_when_idle", |b| {
        b.iter(|| robot.wait_for_idle().expect("idle"));
    });
}

fn locate_in_long_list(c: &mut Criterion) {
    let robot = robot();
    let items: Vec<String> = (0..1_000).map(|i| format!("item {i}")).collect();
    let list = robot
        .add_widget(move || ListBox::new("long", Rect::new(0, 0, 100, 200), 20, items))
        .expect("add widget");
    let matcher = value("item 999");

    c.bench_function("locate_in_long_list", |b| {
        b.iter(|| {
            robot
                .locator()
                .locate_or_fail(&list, matcher.clone(), ScrollPolicy::Always)
                .expect("locate")
        });
    });
}

criterion_group!(benches, query_round_trip, idle_barrier_when_idle, locate_in_long_list);
criterion_main!(benches);
