use sealed::sealed;
use std::collections::HashMap;
use std::ops::Deref;
use std::slice::Iter;

use nanoid::nanoid;

use crate::config::Configurable;
use crate::error::CurationError;
use crate::types::*;

/// Type for Store elements. The struct that owns a field of this type should implement the trait [`StoreFor<T>`].
/// Items are never removed, so the index of an item in the store is its handle for as long as the store lives.
pub type Store<T> = Vec<T>;

/// A map mapping public IDs to internal ids, implemented as a HashMap.
/// Used to resolve public IDs to internal ones.
#[derive(Debug, Clone)]
pub struct IdMap<HandleType> {
    /// The actual map
    data: HashMap<String, HandleType>,

    /// A prefix that automatically generated IDs will get when added to this map
    autoprefix: String,
}

impl<HandleType> Default for IdMap<HandleType>
where
    HandleType: Handle,
{
    fn default() -> Self {
        Self {
            data: HashMap::new(),
            autoprefix: "_".to_string(),
        }
    }
}

impl<HandleType> IdMap<HandleType>
where
    HandleType: Handle,
{
    pub fn new(autoprefix: String) -> Self {
        Self {
            autoprefix,
            ..Self::default()
        }
    }

    pub fn get(&self, id: &str) -> Option<HandleType> {
        self.data.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[sealed(pub(crate))] //<-- this ensures nobody outside this crate can implement the trait
pub trait Storable: PartialEq
where
    Self: Sized,
{
    type HandleType: Handle;
    type StoreType: StoreFor<Self>;

    /// Retrieve the internal (numeric) id. For any type T uses in `StoreFor<T>`, this may be None only in the initial
    /// stage when it is still unbounded to a store.
    fn handle(&self) -> Option<Self::HandleType> {
        None
    }

    /// Get the public ID
    fn id(&self) -> Option<&str> {
        None
    }

    /// Builder pattern to set the public Id
    #[allow(unused_variables)]
    fn with_id(self, id: String) -> Self {
        //no-op
        self
    }

    /// Set the internal ID. May only be called once (though currently not enforced).
    #[allow(unused_variables)]
    fn set_handle(&mut self, handle: <Self as Storable>::HandleType) {
        //no-op in default implementation
    }

    /// Generate a random ID in a given idmap (adds it to the map and assigns it to the item)
    fn generate_id(self, idmap: Option<&mut IdMap<Self::HandleType>>) -> Self {
        if let (Some(intid), Some(idmap)) = (self.handle(), idmap) {
            loop {
                let id = format!("{}{}", idmap.autoprefix, nanoid!());
                let id_copy = id.clone();
                if idmap.data.insert(id, intid).is_none() {
                    //checks for collisions (extremely unlikely)
                    //returns none if the key did not exist yet
                    return self.with_id(id_copy);
                }
            }
        }
        self.with_id(format!("X{}", nanoid!()))
    }
}

/// This trait is implemented on types that provide storage for a certain other generic type (T)
/// It is a sealed trait, not implementable outside this crate.
#[sealed(pub(crate))] //<-- this ensures nobody outside this crate can implement the trait
pub trait StoreFor<T: Storable>: Configurable {
    /// Get a reference to the entire store for the associated type
    fn store(&self) -> &Store<T>;
    /// Get a mutable reference to the entire store for the associated type
    fn store_mut(&mut self) -> &mut Store<T>;
    /// Get a reference to the id map for the associated type, mapping global ids to internal ids
    fn idmap(&self) -> Option<&IdMap<T::HandleType>> {
        None
    }
    /// Get a mutable reference to the id map for the associated type, mapping global ids to internal ids
    fn idmap_mut(&mut self) -> Option<&mut IdMap<T::HandleType>> {
        None
    }

    fn store_typeinfo() -> &'static str;

    /// Adds an item to the store. Returns a handle to it upon success.
    fn insert(&mut self, mut item: T) -> Result<T::HandleType, CurationError> {
        debug(self.config(), || {
            format!("StoreFor<{}>.insert: new item", Self::store_typeinfo())
        });
        if item.handle().is_some() {
            return Err(CurationError::HandleError(
                "Item is already bound to a store",
            ));
        }

        if let Some(id) = item.id() {
            if let Some(existing) = self.idmap().and_then(|idmap| idmap.get(id)) {
                //the ID already exists, if the existing item is exactly the same as the item we're about to insert
                //we return the existing handle without actually inserting a new one
                if self.store().get(existing.as_usize()) == Some(&item) {
                    return Ok(existing);
                }
                return Err(CurationError::DuplicateIdError(
                    id.to_string(),
                    Self::store_typeinfo(),
                ));
            }
        }

        self.preinsert(&mut item)?;

        let handle = self.next_handle();
        item.set_handle(handle);

        if let Some(id) = item.id().map(|id| id.to_string()) {
            if let Some(idmap) = self.idmap_mut() {
                idmap.data.insert(id, handle);
            }
        } else if self.config().generate_ids() && self.idmap().is_some() {
            item = item.generate_id(self.idmap_mut());
            debug(self.config(), || {
                format!(
                    "StoreFor<{}>.insert: ^--- autogenerated id {:?}",
                    Self::store_typeinfo(),
                    item.id()
                )
            });
        }

        self.store_mut().push(item);

        self.inserted(handle)?;

        debug(self.config(), || {
            format!(
                "StoreFor<{}>.insert: ^--- {:?} (insertion complete now)",
                Self::store_typeinfo(),
                handle
            )
        });

        Ok(handle)
    }

    /// Called prior to inserting an item into to the store
    /// If it returns an error, the insert will be cancelled.
    #[allow(unused_variables)]
    fn preinsert(&self, item: &mut T) -> Result<(), CurationError> {
        //default implementation does nothing
        Ok(())
    }

    /// Called after an item was inserted to the store
    /// Allows the store to do further bookkeeping
    /// like updating indices
    #[allow(unused_variables)]
    fn inserted(&mut self, handle: T::HandleType) -> Result<(), CurationError> {
        //default implementation does nothing
        Ok(())
    }

    /// Get a reference to an item from the store, by handle
    fn get(&self, handle: T::HandleType) -> Result<&T, CurationError> {
        self.store()
            .get(handle.as_usize())
            .ok_or(CurationError::HandleError(Self::store_typeinfo()))
    }

    /// Resolves a public ID to a handle
    fn resolve_id(&self, id: &str) -> Result<T::HandleType, CurationError> {
        self.idmap()
            .and_then(|idmap| idmap.get(id))
            .ok_or_else(|| CurationError::IdNotFoundError(id.to_string(), Self::store_typeinfo()))
    }

    /// Get a reference to an item from the store by its public ID
    fn get_by_id(&self, id: &str) -> Result<&T, CurationError> {
        let handle = self.resolve_id(id)?;
        self.get(handle)
    }

    /// Returns true if the store has the item with this handle
    fn has(&self, handle: T::HandleType) -> bool {
        handle.as_usize() < self.store().len()
    }

    /// Iterate over the store
    fn iter(&self) -> StoreIter<'_, T>
    where
        T: Storable<StoreType = Self>,
        Self: Sized,
    {
        StoreIter {
            store: self,
            iter: self.store().iter(),
        }
    }

    /// Return the internal id that will be assigned for the next item to the store
    fn next_handle(&self) -> T::HandleType {
        T::HandleType::new(self.store().len()) //this is one of the very few places in the code where we create a handle from scratch
    }
}

/// This is the iterator to iterate over a Store, it is created by the iter() method from the [`StoreFor<T>`] trait
/// It produces references to the item wrapped in a fat pointer ([`ResultItem<T>`]) that also contains a reference to the store
pub struct StoreIter<'store, T>
where
    T: Storable,
{
    store: &'store T::StoreType,
    iter: Iter<'store, T>,
}

impl<'store, T> Iterator for StoreIter<'store, T>
where
    T: Storable,
{
    type Item = ResultItem<'store, T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|item| ResultItem::new(item, self.store))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

/// This is a smart pointer that encapsulates both the item and the store that owns it.
/// It allows the item to have some more introspection as it knows who its immediate parent is.
/// Items in a [`ResultItem`] are always bound to a store, so [`Self::handle()`] never fails.
pub struct ResultItem<'store, T>
where
    T: Storable,
{
    item: &'store T,
    store: &'store T::StoreType,
}

impl<'store, T> Clone for ResultItem<'store, T>
where
    T: Storable,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<'store, T> Copy for ResultItem<'store, T> where T: Storable {}

impl<'store, T> std::fmt::Debug for ResultItem<'store, T>
where
    T: Storable + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultItem")
            .field("item", self.item)
            .finish()
    }
}

impl<'store, T> ResultItem<'store, T>
where
    T: Storable,
{
    pub(crate) fn new(item: &'store T, store: &'store T::StoreType) -> Self {
        Self { item, store }
    }

    /// Returns a reference to the underlying item
    pub fn as_ref(&self) -> &'store T {
        self.item
    }

    /// Returns a reference to the store that owns the item
    pub fn store(&self) -> &'store T::StoreType {
        self.store
    }

    /// Returns the handle of the item, items in a result are always bound
    pub fn handle(&self) -> T::HandleType {
        self.item
            .handle()
            .expect("items in a ResultItem are always bound")
    }

    /// Returns the public identifier, if any
    pub fn id(&self) -> Option<&'store str> {
        self.item.id()
    }
}

impl<'store, T> Deref for ResultItem<'store, T>
where
    T: Storable,
{
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.item
    }
}

impl<'store, T> PartialEq for ResultItem<'store, T>
where
    T: Storable,
{
    /// Two result items are equal if they refer to the very same item in the very same store (identity)
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.store, other.store) && self.item.handle() == other.item.handle()
    }
}
