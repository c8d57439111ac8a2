//! Shared test model: authors, books, publishers and tags, plus a three-type
//! reference triangle for cycle tests.

#![allow(dead_code)]

use orm_cascade::{
    CascadeOptions, Entity, EntityMetadata, EntityRef, EntityRepository, HasMany, HasOne,
    LifecycleEvent, ObjectId, PersistPlan, PropertyInfo, RelationValue, RelationshipInfo,
    RelationshipKind, RepositoryRegistry, Result, Value,
};
use std::sync::Arc;

// ============================================================================
// Metadata
// ============================================================================

const AUTHOR_PROPERTIES: &[PropertyInfo] = &[
    PropertyInfo::new("name"),
    PropertyInfo::relationship(
        "books",
        RelationshipInfo::new(RelationshipKind::OneHasMany, "Book").target_property("author"),
    ),
];
pub static AUTHOR: EntityMetadata = EntityMetadata::new("Author", AUTHOR_PROPERTIES);

const BOOK_PROPERTIES: &[PropertyInfo] = &[
    PropertyInfo::new("title"),
    PropertyInfo::relationship(
        "author",
        RelationshipInfo::new(RelationshipKind::ManyHasOne, "Author").target_property("books"),
    ),
    PropertyInfo::relationship(
        "translator",
        RelationshipInfo::new(RelationshipKind::ManyHasOne, "Author"),
    )
    .nullable(true),
    PropertyInfo::relationship(
        "publisher",
        RelationshipInfo::new(RelationshipKind::ManyHasOne, "Publisher").target_property("books"),
    )
    .nullable(true),
    PropertyInfo::relationship(
        "tags",
        RelationshipInfo::new(RelationshipKind::ManyHasMany, "Tag").target_property("books"),
    ),
];
pub static BOOK: EntityMetadata = EntityMetadata::new("Book", BOOK_PROPERTIES);

const PUBLISHER_PROPERTIES: &[PropertyInfo] = &[
    PropertyInfo::new("name"),
    PropertyInfo::relationship(
        "books",
        RelationshipInfo::new(RelationshipKind::OneHasMany, "Book")
            .target_property("publisher")
            .cascade(CascadeOptions::NONE),
    ),
];
pub static PUBLISHER: EntityMetadata = EntityMetadata::new("Publisher", PUBLISHER_PROPERTIES);

const TAG_PROPERTIES: &[PropertyInfo] = &[
    PropertyInfo::new("name"),
    PropertyInfo::relationship(
        "books",
        RelationshipInfo::new(RelationshipKind::ManyHasMany, "Book").target_property("tags"),
    ),
];
pub static TAG: EntityMetadata = EntityMetadata::new("Tag", TAG_PROPERTIES);

const TRI_A_PROPERTIES: &[PropertyInfo] = &[PropertyInfo::relationship(
    "next",
    RelationshipInfo::new(RelationshipKind::ManyHasOne, "TriB"),
)
.nullable(true)];
const TRI_B_PROPERTIES: &[PropertyInfo] = &[PropertyInfo::relationship(
    "next",
    RelationshipInfo::new(RelationshipKind::ManyHasOne, "TriC"),
)
.nullable(true)];
const TRI_C_PROPERTIES: &[PropertyInfo] = &[PropertyInfo::relationship(
    "next",
    RelationshipInfo::new(RelationshipKind::ManyHasOne, "TriA"),
)
.nullable(true)];
pub static TRI_A: EntityMetadata = EntityMetadata::new("TriA", TRI_A_PROPERTIES);
pub static TRI_B: EntityMetadata = EntityMetadata::new("TriB", TRI_B_PROPERTIES);
pub static TRI_C: EntityMetadata = EntityMetadata::new("TriC", TRI_C_PROPERTIES);

fn single(rel: &HasOne) -> Result<Option<RelationValue>> {
    Ok(rel.resolve()?.map(RelationValue::Single))
}

// ============================================================================
// Entities
// ============================================================================

#[derive(Debug)]
pub struct Author {
    pub name: String,
    pub persisted: bool,
    pub books: HasMany,
    pub events: Vec<LifecycleEvent>,
}

impl Author {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            persisted: false,
            books: HasMany::new("Book"),
            events: Vec::new(),
        }
    }

    pub fn persisted(name: &str) -> Self {
        Self {
            persisted: true,
            ..Self::new(name)
        }
    }
}

impl Entity for Author {
    fn metadata(&self) -> &'static EntityMetadata {
        &AUTHOR
    }

    fn is_persisted(&self) -> bool {
        self.persisted
    }

    fn raw_property(&self, name: &str) -> Value {
        match name {
            "name" => Value::from(self.name.as_str()),
            "books" => self.books.raw_value(),
            _ => Value::Null,
        }
    }

    fn is_loaded(&self, name: &str) -> bool {
        match name {
            "books" => self.books.is_loaded(),
            _ => true,
        }
    }

    fn value(&self, name: &str) -> Result<Option<RelationValue>> {
        match name {
            "books" => Ok(Some(RelationValue::Many(self.books.collection()))),
            _ => Ok(None),
        }
    }

    fn before_persist(&mut self) -> Result<()> {
        self.events.push(LifecycleEvent::BeforePersist);
        Ok(())
    }

    fn after_persist(&mut self) -> Result<()> {
        self.events.push(LifecycleEvent::AfterPersist);
        Ok(())
    }
}

#[derive(Debug)]
pub struct Book {
    pub title: String,
    pub persisted: bool,
    pub author: HasOne,
    pub translator: HasOne,
    pub publisher: HasOne,
    pub tags: HasMany,
    pub events: Vec<LifecycleEvent>,
}

impl Book {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            persisted: false,
            author: HasOne::new("Author"),
            translator: HasOne::new("Author"),
            publisher: HasOne::new("Publisher"),
            tags: HasMany::new("Tag"),
            events: Vec::new(),
        }
    }

    pub fn persisted(title: &str) -> Self {
        Self {
            persisted: true,
            ..Self::new(title)
        }
    }
}

impl Entity for Book {
    fn metadata(&self) -> &'static EntityMetadata {
        &BOOK
    }

    fn is_persisted(&self) -> bool {
        self.persisted
    }

    fn raw_property(&self, name: &str) -> Value {
        match name {
            "title" => Value::from(self.title.as_str()),
            "author" => self.author.raw_value(),
            "translator" => self.translator.raw_value(),
            "publisher" => self.publisher.raw_value(),
            "tags" => self.tags.raw_value(),
            _ => Value::Null,
        }
    }

    fn is_loaded(&self, name: &str) -> bool {
        match name {
            "author" => self.author.is_loaded(),
            "translator" => self.translator.is_loaded(),
            "publisher" => self.publisher.is_loaded(),
            "tags" => self.tags.is_loaded(),
            _ => true,
        }
    }

    fn value(&self, name: &str) -> Result<Option<RelationValue>> {
        match name {
            "author" => single(&self.author),
            "translator" => single(&self.translator),
            "publisher" => single(&self.publisher),
            "tags" => Ok(Some(RelationValue::Many(self.tags.collection()))),
            _ => Ok(None),
        }
    }

    fn before_persist(&mut self) -> Result<()> {
        self.events.push(LifecycleEvent::BeforePersist);
        Ok(())
    }

    fn after_persist(&mut self) -> Result<()> {
        self.events.push(LifecycleEvent::AfterPersist);
        Ok(())
    }
}

#[derive(Debug)]
pub struct Publisher {
    pub name: String,
    pub books: HasMany,
}

impl Publisher {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            books: HasMany::new("Book"),
        }
    }
}

impl Entity for Publisher {
    fn metadata(&self) -> &'static EntityMetadata {
        &PUBLISHER
    }

    fn is_persisted(&self) -> bool {
        false
    }

    fn raw_property(&self, name: &str) -> Value {
        match name {
            "name" => Value::from(self.name.as_str()),
            "books" => self.books.raw_value(),
            _ => Value::Null,
        }
    }

    fn is_loaded(&self, name: &str) -> bool {
        name != "books" || self.books.is_loaded()
    }

    fn value(&self, name: &str) -> Result<Option<RelationValue>> {
        match name {
            "books" => Ok(Some(RelationValue::Many(self.books.collection()))),
            _ => Ok(None),
        }
    }
}

#[derive(Debug)]
pub struct Tag {
    pub name: String,
    pub books: HasMany,
}

impl Tag {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            books: HasMany::new("Book"),
        }
    }
}

impl Entity for Tag {
    fn metadata(&self) -> &'static EntityMetadata {
        &TAG
    }

    fn is_persisted(&self) -> bool {
        false
    }

    fn raw_property(&self, name: &str) -> Value {
        match name {
            "name" => Value::from(self.name.as_str()),
            "books" => self.books.raw_value(),
            _ => Value::Null,
        }
    }

    fn is_loaded(&self, name: &str) -> bool {
        name != "books" || self.books.is_loaded()
    }

    fn value(&self, name: &str) -> Result<Option<RelationValue>> {
        match name {
            "books" => Ok(Some(RelationValue::Many(self.books.collection()))),
            _ => Ok(None),
        }
    }
}

/// One corner of the TriA -> TriB -> TriC -> TriA triangle.
#[derive(Debug)]
pub struct Vertex {
    pub metadata: &'static EntityMetadata,
    pub persisted: bool,
    pub next: HasOne,
}

impl Vertex {
    pub fn entity(metadata: &'static EntityMetadata, persisted: bool) -> EntityRef {
        let target = metadata.properties[0]
            .relationship
            .map_or("", |rel| rel.target_entity);
        EntityRef::new(Self {
            metadata,
            persisted,
            next: HasOne::new(target),
        })
    }
}

impl Entity for Vertex {
    fn metadata(&self) -> &'static EntityMetadata {
        self.metadata
    }

    fn is_persisted(&self) -> bool {
        self.persisted
    }

    fn raw_property(&self, name: &str) -> Value {
        match name {
            "next" => self.next.raw_value(),
            _ => Value::Null,
        }
    }

    fn is_loaded(&self, name: &str) -> bool {
        name != "next" || self.next.is_loaded()
    }

    fn value(&self, name: &str) -> Result<Option<RelationValue>> {
        match name {
            "next" => single(&self.next),
            _ => Ok(None),
        }
    }
}

// ============================================================================
// Graph helpers
// ============================================================================

pub fn author(name: &str) -> EntityRef {
    EntityRef::new(Author::new(name))
}

pub fn book(title: &str) -> EntityRef {
    EntityRef::new(Book::new(title))
}

pub fn tag(name: &str) -> EntityRef {
    EntityRef::new(Tag::new(name))
}

pub fn publisher(name: &str) -> EntityRef {
    EntityRef::new(Publisher::new(name))
}

/// Set `book.author` and add the book to `author.books`.
pub fn write_book(author: &EntityRef, book: &EntityRef) {
    book.with_mut(|b: &mut Book| b.author.set(Some(author.clone())))
        .expect("is a Book");
    author
        .with(|a: &Author| a.books.add(book))
        .expect("is an Author");
}

/// Tag a book on both sides of the many-to-many.
pub fn tag_book(book: &EntityRef, tag: &EntityRef) {
    book.with(|b: &Book| b.tags.add(tag)).expect("is a Book");
    tag.with(|t: &Tag| t.books.add(book)).expect("is a Tag");
}

pub fn publish(publisher: &EntityRef, book: &EntityRef) {
    book.with_mut(|b: &mut Book| b.publisher.set(Some(publisher.clone())))
        .expect("is a Book");
    publisher
        .with(|p: &Publisher| p.books.add(book))
        .expect("is a Publisher");
}

/// Point a triangle vertex at the next one.
pub fn link(from: &EntityRef, to: &EntityRef) {
    from.with_mut(|v: &mut Vertex| v.next.set(Some(to.clone())))
        .expect("is a Vertex");
}

/// Lifecycle events an author or book received.
pub fn events(entity: &EntityRef) -> Vec<LifecycleEvent> {
    entity
        .with(|b: &Book| b.events.clone())
        .or_else(|| entity.with(|a: &Author| a.events.clone()))
        .unwrap_or_default()
}

// ============================================================================
// Repositories
// ============================================================================

pub struct Repos {
    pub registry: RepositoryRegistry,
    pub authors: Arc<EntityRepository>,
    pub books: Arc<EntityRepository>,
    /// Serves publishers, tags and the triangle types.
    pub misc: Arc<EntityRepository>,
}

pub fn repos() -> Repos {
    let authors = Arc::new(EntityRepository::new("authors", &["Author"]));
    let books = Arc::new(EntityRepository::new("books", &["Book"]));
    let misc = Arc::new(EntityRepository::new(
        "misc",
        &["Publisher", "Tag", "TriA", "TriB", "TriC"],
    ));
    let registry = RepositoryRegistry::new()
        .with(authors.clone())
        .with(books.clone())
        .with(misc.clone());
    Repos {
        registry,
        authors,
        books,
        misc,
    }
}

/// Entity ids of a plan, in write order.
pub fn entity_order(plan: &PersistPlan) -> Vec<ObjectId> {
    plan.entities().map(EntityRef::id).collect()
}

pub fn position(plan: &PersistPlan, entity: &EntityRef) -> usize {
    plan.position_of(entity.id()).expect("entity is planned")
}
