use criterion::{Criterion, criterion_group, criterion_main};
use domain::{User, UserService, UpdateUser};
use entity_store::{ChangeEnvelope, InMemoryEntityStore, Version};
use projections::{Projection, ProjectionProcessor, UserView};

/// Populate a store with N users, each updated three times.
async fn populate_store(store: &InMemoryEntityStore, n: usize) {
    let service = UserService::new(store.clone());
    for i in 0..n {
        let key = format!("user-{i}");
        for status in ["new", "active", "blocked"] {
            service
                .update_user(UpdateUser::new(key.as_str(), User::new("Bench", status, [])))
                .await
                .unwrap();
        }
    }
}

fn bench_catch_up_100_users(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEntityStore::new();

    rt.block_on(populate_store(&store, 100));

    c.bench_function("projections/catch_up_300_changes", |b| {
        b.iter(|| {
            rt.block_on(async {
                let view = UserView::new();
                let mut processor = ProjectionProcessor::new(store.clone());
                processor.register(Box::new(view.clone()) as Box<dyn Projection>);
                processor.run_catch_up().await.unwrap();
            });
        });
    });
}

fn bench_catch_up_1000_users(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEntityStore::new();

    rt.block_on(populate_store(&store, 1000));

    c.bench_function("projections/catch_up_3000_changes", |b| {
        b.iter(|| {
            rt.block_on(async {
                let view = UserView::new();
                let mut processor = ProjectionProcessor::new(store.clone());
                processor.register(Box::new(view.clone()) as Box<dyn Projection>);
                processor.run_catch_up().await.unwrap();
            });
        });
    });
}

fn bench_single_change(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let view = UserView::new();
    let user = User::new("Bench", "active", []);

    let mut sequence = 0u64;
    c.bench_function("projections/user_view_single_change", |b| {
        b.iter(|| {
            sequence += 1;
            let mut change = ChangeEnvelope::builder()
                .entity_type("User")
                .key("user-1")
                .version(Version::new(sequence as i64))
                .state(&user)
                .unwrap()
                .build();
            change.sequence = sequence;
            rt.block_on(view.handle(&change)).unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_catch_up_100_users,
    bench_catch_up_1000_users,
    bench_single_change
);
criterion_main!(benches);
