use crate::external_connections::ExternalConnectivity;
use anyhow::Context;
use chrono::{DateTime, Utc};

/// A persisted task. Tasks belong to exactly one user for their entire lifetime,
/// and every operation on them is scoped by that owner.
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(test, derive(Clone))]
pub struct Task {
    pub id: i64,
    pub user_id: i64,
    pub description: String,
    pub status: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
#[cfg_attr(test, derive(Clone, PartialEq, Eq))]
pub struct NewTask {
    pub description: String,
}

pub mod driven_ports {
    use super::*;

    pub trait TaskReader {
        async fn tasks_for_user(
            &self,
            user_id: i64,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<Task>, anyhow::Error>;
    }

    pub trait TaskWriter {
        async fn create_task_for_user(
            &self,
            user_id: i64,
            new_task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Task, anyhow::Error>;

        /// Returns the number of rows the update touched. The statement must scope
        /// on both the task id and the owner so a foreign task is left untouched.
        async fn set_task_status(
            &self,
            user_id: i64,
            task_id: i64,
            status: bool,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<u64, anyhow::Error>;

        /// Returns the number of rows removed, scoped on (task id, owner) like
        /// [TaskWriter::set_task_status].
        async fn delete_task(
            &self,
            user_id: i64,
            task_id: i64,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<u64, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum TaskError {
        /// The task does not exist, or exists under a different owner. The two are
        /// indistinguishable on purpose so ids cannot be probed across users.
        #[error("the referenced task does not exist for the requesting user")]
        NotFound,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }


    pub trait TaskPort {
        async fn tasks_for_user(
            &self,
            user_id: i64,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<Vec<Task>, anyhow::Error>;

        async fn create_task(
            &self,
            user_id: i64,
            new_task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<Task, anyhow::Error>;

        async fn set_task_status(
            &self,
            user_id: i64,
            task_id: i64,
            status: bool,
            ext_cxn: &mut impl ExternalConnectivity,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<(), TaskError>;

        async fn delete_task(
            &self,
            user_id: i64,
            task_id: i64,
            ext_cxn: &mut impl ExternalConnectivity,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<(), TaskError>;
    }
}

pub struct TaskService {}

impl driving_ports::TaskPort for TaskService {
    async fn tasks_for_user(
        &self,
        user_id: i64,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl driven_ports::TaskReader,
    ) -> Result<Vec<Task>, anyhow::Error> {
        let tasks = task_read
            .tasks_for_user(user_id, &mut *ext_cxn)
            .await
            .context("listing a user's tasks")?;

        Ok(tasks)
    }

    async fn create_task(
        &self,
        user_id: i64,
        new_task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
        task_write: &impl driven_ports::TaskWriter,
    ) -> Result<Task, anyhow::Error> {
        let created_task = task_write
            .create_task_for_user(user_id, new_task, &mut *ext_cxn)
            .await
            .context("creating a task")?;

        Ok(created_task)
    }

    async fn set_task_status(
        &self,
        user_id: i64,
        task_id: i64,
        status: bool,
        ext_cxn: &mut impl ExternalConnectivity,
        task_write: &impl driven_ports::TaskWriter,
    ) -> Result<(), driving_ports::TaskError> {
        let rows_touched = task_write
            .set_task_status(user_id, task_id, status, &mut *ext_cxn)
            .await
            .context("updating a task's status")?;

        if rows_touched == 0 {
            return Err(driving_ports::TaskError::NotFound);
        }

        Ok(())
    }

    async fn delete_task(
        &self,
        user_id: i64,
        task_id: i64,
        ext_cxn: &mut impl ExternalConnectivity,
        task_write: &impl driven_ports::TaskWriter,
    ) -> Result<(), driving_ports::TaskError> {
        let rows_removed = task_write
            .delete_task(user_id, task_id, &mut *ext_cxn)
            .await
            .context("deleting a task")?;

        if rows_removed == 0 {
            return Err(driving_ports::TaskError::NotFound);
        }

        Ok(())
    }
}


#[cfg(test)]
pub mod test_util {
    use super::driven_ports::{TaskReader, TaskWriter};
    use super::driving_ports::TaskError;
    use super::*;
    use crate::domain::test_util::{Connectivity, FakeCall};
    use std::sync::{Mutex, RwLock};

    /// In-memory task persistence that scopes mutations by (task id, owner) the way
    /// the real statements do.
    pub struct InMemoryTaskStore {
        pub tasks: Vec<Task>,
        pub connected: Connectivity,
        highest_task_id: i64,
    }

    pub struct SeedTask {
        pub owner: i64,
        pub description: &'static str,
    }

    impl InMemoryTaskStore {
        pub fn new() -> InMemoryTaskStore {
            InMemoryTaskStore {
                tasks: Vec::new(),
                connected: Connectivity::Connected,
                highest_task_id: 0,
            }
        }

        pub fn new_locked() -> RwLock<InMemoryTaskStore> {
            RwLock::new(Self::new())
        }

        pub fn new_locked_with_tasks(seeds: &[SeedTask]) -> RwLock<InMemoryTaskStore> {
            RwLock::new(InMemoryTaskStore {
                tasks: seeds
                    .iter()
                    .enumerate()
                    .map(|(index, seed)| Task {
                        id: index as i64 + 1,
                        user_id: seed.owner,
                        description: seed.description.to_owned(),
                        status: false,
                        created_at: Utc::now(),
                    })
                    .collect(),
                connected: Connectivity::Connected,
                highest_task_id: seeds.len() as i64,
            })
        }
    }

    impl TaskReader for RwLock<InMemoryTaskStore> {
        async fn tasks_for_user(
            &self,
            user_id: i64,
            _ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<Task>, anyhow::Error> {
            let store = self.read().expect("task store rw lock poisoned");
            store.connected.blow_up_if_disconnected()?;

            Ok(store
                .tasks
                .iter()
                .filter(|task| task.user_id == user_id)
                .cloned()
                .collect())
        }
    }

    impl TaskWriter for RwLock<InMemoryTaskStore> {
        async fn create_task_for_user(
            &self,
            user_id: i64,
            new_task: &NewTask,
            _ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Task, anyhow::Error> {
            let mut store = self.write().expect("task store rw lock poisoned");
            store.connected.blow_up_if_disconnected()?;

            store.highest_task_id += 1;
            let task = Task {
                id: store.highest_task_id,
                user_id,
                description: new_task.description.clone(),
                status: false,
                created_at: Utc::now(),
            };
            store.tasks.push(task.clone());

            Ok(task)
        }

        async fn set_task_status(
            &self,
            user_id: i64,
            task_id: i64,
            status: bool,
            _ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<u64, anyhow::Error> {
            let mut store = self.write().expect("task store rw lock poisoned");
            store.connected.blow_up_if_disconnected()?;

            let matching_task = store
                .tasks
                .iter_mut()
                .find(|task| task.id == task_id && task.user_id == user_id);
            match matching_task {
                Some(task) => {
                    task.status = status;
                    Ok(1)
                }
                None => Ok(0),
            }
        }

        async fn delete_task(
            &self,
            user_id: i64,
            task_id: i64,
            _ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<u64, anyhow::Error> {
            let mut store = self.write().expect("task store rw lock poisoned");
            store.connected.blow_up_if_disconnected()?;

            let task_index = store
                .tasks
                .iter()
                .position(|task| task.id == task_id && task.user_id == user_id);
            match task_index {
                Some(index) => {
                    store.tasks.remove(index);
                    Ok(1)
                }
                None => Ok(0),
            }
        }
    }

    pub struct MockTaskService {
        pub tasks_for_user_result: FakeCall<i64, anyhow::Result<Vec<Task>>>,
        pub create_task_result: FakeCall<(i64, NewTask), anyhow::Result<Task>>,
        pub set_task_status_result: FakeCall<(i64, i64, bool), Result<(), TaskError>>,
        pub delete_task_result: FakeCall<(i64, i64), Result<(), TaskError>>,
    }

    impl MockTaskService {
        pub fn new() -> MockTaskService {
            MockTaskService {
                tasks_for_user_result: FakeCall::new(),
                create_task_result: FakeCall::new(),
                set_task_status_result: FakeCall::new(),
                delete_task_result: FakeCall::new(),
            }
        }
    }

    impl driving_ports::TaskPort for Mutex<MockTaskService> {
        async fn tasks_for_user(
            &self,
            user_id: i64,
            _ext_cxn: &mut impl ExternalConnectivity,
            _task_read: &impl TaskReader,
        ) -> Result<Vec<Task>, anyhow::Error> {
            let mut locked_self = self.lock().expect("mock task service mutex poisoned");
            locked_self.tasks_for_user_result.record(user_id);

            locked_self.tasks_for_user_result.anyhow_result()
        }

        async fn create_task(
            &self,
            user_id: i64,
            new_task: &NewTask,
            _ext_cxn: &mut impl ExternalConnectivity,
            _task_write: &impl TaskWriter,
        ) -> Result<Task, anyhow::Error> {
            let mut locked_self = self.lock().expect("mock task service mutex poisoned");
            locked_self
                .create_task_result
                .record((user_id, new_task.clone()));

            locked_self.create_task_result.anyhow_result()
        }

        async fn set_task_status(
            &self,
            user_id: i64,
            task_id: i64,
            status: bool,
            _ext_cxn: &mut impl ExternalConnectivity,
            _task_write: &impl TaskWriter,
        ) -> Result<(), TaskError> {
            let mut locked_self = self.lock().expect("mock task service mutex poisoned");
            locked_self
                .set_task_status_result
                .record((user_id, task_id, status));

            locked_self.set_task_status_result.result()
        }

        async fn delete_task(
            &self,
            user_id: i64,
            task_id: i64,
            _ext_cxn: &mut impl ExternalConnectivity,
            _task_write: &impl TaskWriter,
        ) -> Result<(), TaskError> {
            let mut locked_self = self.lock().expect("mock task service mutex poisoned");
            locked_self.delete_task_result.record((user_id, task_id));

            locked_self.delete_task_result.result()
        }
    }
}
