use cucumber::given;

use crate::cucumber::{loyalty_world::LoyaltySystem, LoyaltyWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut LoyaltyWorld) {
    let system = LoyaltySystem::new().await;
    world.system = Some(system);
}

#[given(expr = "a user '{word}'")]
async fn registered_user(world: &mut LoyaltyWorld, login: String) {
    let user = world.auth().register_user(&login, "password123").await.expect("Error registering user");
    world.users.insert(login, user.id);
}
