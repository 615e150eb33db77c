use recipe_fork::{
    get_merged_items, BackendFactory, BackendKind, GroceryBackend, GroceryConfig, GroceryService,
    GroceryStore, JsonFileBackend,
};

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_same_unit_quantities_sum() {
    let mut store = GroceryStore::new();
    store.add_recipe("cookies", "Cookies", &lines(&["- 1 cup sugar"]), None, None);
    store.add_recipe("cake", "Cake", &lines(&["- 1 cup sugar"]), None, None);

    let items = get_merged_items(&store);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, Some(2.0));
    assert_eq!(items[0].sources, vec!["Cookies", "Cake"]);
}

#[test]
fn test_mixed_units_keep_first_quantity() {
    let mut store = GroceryStore::new();
    store.add_recipe("a", "A", &lines(&["1 cup sugar"]), None, None);
    store.add_recipe("b", "B", &lines(&["200 g sugar"]), None, None);

    let items = get_merged_items(&store);
    let quantities: Vec<Option<f64>> = items.iter().map(|i| i.quantity).collect();
    assert_eq!(items.len(), 2);
    assert!(quantities.contains(&Some(1.0)));
    assert!(quantities.contains(&Some(200.0)));
}

#[test]
fn test_items_sorted_by_name() {
    let mut store = GroceryStore::new();
    store.add_recipe(
        "a",
        "A",
        &lines(&["2 zucchini", "1 cup basil", "3 tbsp olive oil"]),
        None,
        None,
    );
    let names: Vec<String> = get_merged_items(&store)
        .into_iter()
        .map(|i| i.name)
        .collect();
    assert_eq!(names, vec!["basil", "olive oil", "zucchini"]);
}

#[tokio::test]
async fn test_file_backend_persists_between_services() {
    let dir = tempfile::tempdir().unwrap();
    let config = GroceryConfig {
        backend: BackendKind::File,
        path: dir.path().join("grocery-list.json"),
    };

    let service = GroceryService::from_config(&config);
    assert_eq!(service.backend_name(), "file");
    service
        .update(|store| {
            store.add_recipe(
                "chili",
                "Chili",
                &lines(&["1 lb beef", "2 cans beans"]),
                Some("smoky"),
                Some("4"),
            )
        })
        .await
        .unwrap();
    service
        .update(|store| {
            store.toggle_checked("can:beans");
        })
        .await
        .unwrap();

    let reopened = GroceryService::from_config(&config);
    let store = reopened.load().await.unwrap();
    assert_eq!(store.recipes["chili"].servings.as_deref(), Some("4"));
    assert_eq!(
        store.export_text(),
        "To buy:\n[ ] 1 lb beef\n\nGot it:\n[x] 2 can beans\n"
    );
}

#[tokio::test]
async fn test_stored_json_matches_wire_shape() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("list.json");
    let backend = JsonFileBackend::new(&path);

    let mut store = GroceryStore::new();
    store.add_recipe("soup", "Soup", &lines(&["1 onion, diced"]), None, None);
    backend.save(&store).await.unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let item = &json["recipes"]["soup"]["items"][0];
    assert_eq!(item["name"], "onion");
    assert_eq!(item["displayText"], "onion, diced");
    assert_eq!(item["quantity"], 1.0);
}

#[tokio::test]
async fn test_memory_backend_from_config() {
    let backend = BackendFactory::create(&GroceryConfig {
        backend: BackendKind::Memory,
        ..GroceryConfig::default()
    });
    let service = GroceryService::new(backend);
    let store = service
        .update(|store| store.add_recipe("a", "A", &lines(&["1 egg"]), None, None))
        .await
        .unwrap();
    assert_eq!(store.recipes.len(), 1);

    let cleared = service.update(|store| store.clear_all()).await.unwrap();
    assert!(cleared.is_empty());
    assert!(service.load().await.unwrap().is_empty());
}
