use boxbook_core::db::open_db_in_memory;
use boxbook_core::{
    BookStatus, InventoryRepository, InventoryService, ManualClock, MemoryInventoryRepository,
    NewBook, SqliteInventoryRepository, BOX_CAPACITY,
};

/// Small deterministic generator so failures reproduce without extra crates.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: usize) -> usize {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        ((self.0 >> 33) as usize) % bound.max(1)
    }
}

fn drive_random_operations<R: InventoryRepository>(
    service: &InventoryService<R, &ManualClock>,
    clock: &ManualClock,
    seed: u64,
) {
    let mut rng = Lcg(seed);
    for step in 0..300 {
        clock.advance(1);
        let boxes = service.list_boxes().unwrap();
        let books = service.list_books().unwrap();
        let pick_box = |rng: &mut Lcg| boxes.get(rng.next(boxes.len())).map(|b| b.id);
        let pick_book = |rng: &mut Lcg| books.get(rng.next(books.len())).map(|b| b.id);

        // Rejections are expected; only the resulting state is checked.
        match rng.next(8) {
            0 => {
                let _ = service.create_box(format!("box-{step}"));
            }
            1 => {
                let _ = service.create_book(book_input(step));
            }
            2 => {
                if let Some(box_id) = pick_box(&mut rng) {
                    let _ = service.create_book_in_box(box_id, book_input(step));
                }
            }
            3 | 4 => {
                if let (Some(box_id), Some(book_id)) = (pick_box(&mut rng), pick_book(&mut rng)) {
                    let _ = service.add_book_to_box(box_id, book_id);
                }
            }
            5 => {
                if let (Some(box_id), Some(book_id)) = (pick_box(&mut rng), pick_book(&mut rng)) {
                    let _ = service.remove_book_from_box(box_id, book_id);
                }
            }
            6 => {
                if let Some(box_id) = pick_box(&mut rng) {
                    let _ = service.delete_box(box_id);
                }
            }
            _ => {
                if let Some(book_id) = pick_book(&mut rng) {
                    let _ = service.delete_book(book_id);
                }
            }
        }

        assert_state_consistent(service, step);
    }
}

fn book_input(step: usize) -> NewBook {
    NewBook {
        title: format!("book-{step}"),
        description: String::new(),
        author: String::new(),
        price: step as f64,
    }
}

fn assert_state_consistent<R: InventoryRepository>(
    service: &InventoryService<R, &ManualClock>,
    step: usize,
) {
    let boxes = service.list_boxes().unwrap();
    let books = service.list_books().unwrap();

    for record in &boxes {
        assert!(record.contents.len() <= BOX_CAPACITY, "step {step}: box over capacity");
        for book_id in &record.contents {
            assert!(
                books.iter().any(|book| book.id == *book_id),
                "step {step}: box lists missing book"
            );
        }
    }

    for book in &books {
        let owners = boxes
            .iter()
            .map(|record| record.contents.iter().filter(|id| **id == book.id).count())
            .sum::<usize>();
        let expected = usize::from(book.status == BookStatus::Stored);
        assert_eq!(owners, expected, "step {step}: book {} membership", book.id);

        match service.locate_book(book.id) {
            Ok(box_id) => assert!(boxes
                .iter()
                .any(|record| record.id == box_id && record.contains(book.id))),
            Err(err) => assert_eq!(book.status, BookStatus::Unstored, "step {step}: {err}"),
        }
    }
}

#[test]
fn memory_adapter_holds_invariants_under_random_operations() {
    for seed in [1, 7, 42] {
        let clock = ManualClock::new(0);
        let service = InventoryService::with_clock(MemoryInventoryRepository::new(), &clock);
        drive_random_operations(&service, &clock, seed);
    }
}

#[test]
fn sqlite_adapter_holds_invariants_under_random_operations() {
    for seed in [3, 11] {
        let conn = open_db_in_memory().unwrap();
        let clock = ManualClock::new(0);
        let service =
            InventoryService::with_clock(SqliteInventoryRepository::try_new(&conn).unwrap(), &clock);
        drive_random_operations(&service, &clock, seed);
    }
}

#[test]
fn concurrent_adds_never_overfill_a_box() {
    let service = InventoryService::new(MemoryInventoryRepository::new());
    let shelf = service.create_box("Shared").unwrap();
    let books = (0..12)
        .map(|index| service.create_book(book_input(index)).unwrap().id)
        .collect::<Vec<_>>();

    let outcomes = std::thread::scope(|scope| {
        let handles = books
            .iter()
            .map(|book_id| {
                let service = &service;
                let shelf_id = shelf.id;
                let book_id = *book_id;
                scope.spawn(move || service.add_book_to_box(shelf_id, book_id).is_ok())
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect::<Vec<_>>()
    });
    assert_eq!(outcomes.iter().filter(|ok| **ok).count(), BOX_CAPACITY);

    let stored = books
        .iter()
        .filter(|id| service.get_book(**id).unwrap().status == BookStatus::Stored)
        .count();
    assert_eq!(stored, BOX_CAPACITY);
    assert_eq!(service.get_box(shelf.id).unwrap().contents.len(), BOX_CAPACITY);
}
